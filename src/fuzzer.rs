//! Deterministic generator of nested content trees.
//!
//! Every contender in a trial must see the same input, so the fuzzer is a
//! pure function of its seed, its shape and the number of trees drawn so
//! far. Two fuzzers built from the same config produce the same sequence
//! of trees in any process.
//!
//! Ranges are `[min, max]` pairs sampled half-open (`min..max`); a range
//! with `min == max` always yields `min`. A depth budget of 0 yields a bare
//! scalar, so `depth_range = [0, 1]` generates scalar-only content.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;

/// A generated content tree: a scalar, or an object of content trees.
pub type Content = serde_json::Value;

/// Keys are drawn from this list.
const WORDS: &[&str] = &[
    "author", "body", "caret", "color", "cursor", "draft", "editor", "focus", "glyph", "handle",
    "index", "layer", "margin", "name", "offset", "owner", "page", "panel", "point", "presence",
    "range", "scroll", "selection", "shape", "status", "style", "tab", "title", "viewport", "zoom",
];

/// An inclusive-looking `[min, max]` pair, sampled as `min..max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u64; 2]", into = "[u64; 2]")]
pub struct Bounds {
    pub min: u64,
    pub max: u64,
}

impl Bounds {
    pub fn new(min: u64, max: u64) -> Bounds {
        return Bounds { min, max };
    }

    /// Draw a value. Degenerate ranges do not advance the generator.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u64 {
        if self.min >= self.max {
            return self.min;
        }
        return rng.gen_range(self.min..self.max);
    }
}

impl TryFrom<[u64; 2]> for Bounds {
    type Error = String;

    fn try_from([min, max]: [u64; 2]) -> Result<Self, Self::Error> {
        if min > max {
            return Err(format!("range [{min}, {max}] has min > max"));
        }
        return Ok(Bounds { min, max });
    }
}

impl From<Bounds> for [u64; 2] {
    fn from(bounds: Bounds) -> Self {
        return [bounds.min, bounds.max];
    }
}

/// Size and shape of generated trees, without a seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeShape {
    pub value_range: Bounds,
    pub depth_range: Bounds,
    pub branch_range: Bounds,
}

impl TreeShape {
    pub fn with_seed(self, seed: u64) -> FuzzerConfig {
        return FuzzerConfig {
            seed,
            value_range: self.value_range,
            depth_range: self.depth_range,
            branch_range: self.branch_range,
        };
    }
}

impl Default for TreeShape {
    fn default() -> Self {
        return TreeShape {
            value_range: Bounds::new(2, 6),
            depth_range: Bounds::new(1, 2),
            branch_range: Bounds::new(1, 5),
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzerConfig {
    pub seed: u64,
    pub value_range: Bounds,
    pub depth_range: Bounds,
    pub branch_range: Bounds,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        return TreeShape::default().with_seed(0);
    }
}

pub struct Fuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl Fuzzer {
    pub fn new(config: FuzzerConfig) -> Fuzzer {
        return Fuzzer {
            config,
            rng: StdRng::seed_from_u64(config.seed),
        };
    }

    pub fn config(&self) -> &FuzzerConfig {
        return &self.config;
    }

    /// Reset the generator as if freshly built with `seed`.
    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn generate_content(&mut self) -> Content {
        let budget = self.config.depth_range.sample(&mut self.rng);
        return self.generate_node(budget);
    }

    /// Two consecutive trees.
    pub fn generate_pair(&mut self) -> (Content, Content) {
        let first = self.generate_content();
        let second = self.generate_content();
        return (first, second);
    }

    fn generate_node(&mut self, budget: u64) -> Content {
        if budget == 0 {
            return Content::from(self.config.value_range.sample(&mut self.rng));
        }

        let branches = self.config.branch_range.sample(&mut self.rng);
        let mut children = Map::new();
        for _ in 0..branches {
            let key = self.fresh_key(&children);
            let child = self.generate_node(budget - 1);
            children.insert(key, child);
        }
        return Content::Object(children);
    }

    /// A word not yet used among `taken`, suffixed with an ordinal on
    /// collision so every draw adds exactly one child.
    fn fresh_key(&mut self, taken: &Map<String, Content>) -> String {
        let word = WORDS[self.rng.gen_range(0..WORDS.len())];
        if !taken.contains_key(word) {
            return word.to_string();
        }
        let mut ordinal = 2;
        loop {
            let key = format!("{word}-{ordinal}");
            if !taken.contains_key(&key) {
                return key;
            }
            ordinal += 1;
        }
    }
}

/// Greatest nesting depth of a tree; bare scalars have depth 0.
pub fn depth(content: &Content) -> usize {
    return match content {
        Content::Object(children) => 1 + children.values().map(depth).max().unwrap_or(0),
        _ => 0,
    };
}
