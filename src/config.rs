//! Suite configuration.
//!
//! One `SuiteConfig` is built up front and passed by reference to every
//! runner. The shared seed lives here; each dimension builds its own
//! fuzzer from it.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::contender::ContenderKind;
use crate::error::BenchError;
use crate::error::Result;
use crate::fuzzer::Bounds;
use crate::fuzzer::TreeShape;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub seed: u64,
    pub output_dir: PathBuf,
    pub contenders: Vec<ContenderKind>,
    pub delta_size: TrialConfig,
    pub deletion_size: TrialConfig,
    pub crdt_size: SnapshotConfig,
    pub additions: AdditionsConfig,
    pub merges: MergesConfig,
}

/// A sampled size dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    pub trials: usize,
    pub shape: TreeShape,
}

/// A single-trial size dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub shape: TreeShape,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionsConfig {
    pub warmup_rounds: usize,
    pub rounds: usize,
    pub include_setup_cost: bool,
    /// Keys written per thunk call.
    pub batch: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergesConfig {
    pub warmup_rounds: usize,
    pub rounds: usize,
    pub include_setup_cost: bool,
    pub shape: TreeShape,
}

fn shape(value: [u64; 2], depth: [u64; 2], branch: [u64; 2]) -> TreeShape {
    return TreeShape {
        value_range: Bounds::new(value[0], value[1]),
        depth_range: Bounds::new(depth[0], depth[1]),
        branch_range: Bounds::new(branch[0], branch[1]),
    };
}

impl Default for SuiteConfig {
    fn default() -> Self {
        return SuiteConfig {
            seed: 1,
            output_dir: PathBuf::from("results"),
            contenders: ContenderKind::ALL.to_vec(),
            delta_size: TrialConfig {
                trials: 1000,
                shape: shape([2, 6], [1, 4], [1, 5]),
            },
            deletion_size: TrialConfig {
                trials: 100,
                shape: shape([2, 6], [1, 4], [1, 5]),
            },
            crdt_size: SnapshotConfig {
                shape: shape([2, 6], [3, 4], [4, 5]),
            },
            additions: AdditionsConfig::default(),
            merges: MergesConfig::default(),
        };
    }
}

impl Default for AdditionsConfig {
    fn default() -> Self {
        return AdditionsConfig {
            warmup_rounds: 3,
            rounds: 7,
            include_setup_cost: false,
            batch: 1000,
        };
    }
}

impl Default for MergesConfig {
    fn default() -> Self {
        return MergesConfig {
            warmup_rounds: 3,
            rounds: 7,
            include_setup_cost: false,
            shape: shape([2, 6], [2, 4], [2, 5]),
        };
    }
}

impl SuiteConfig {
    pub fn from_toml_str(text: &str) -> Result<SuiteConfig> {
        let config: SuiteConfig = toml::from_str(text)?;
        config.validate()?;
        return Ok(config);
    }

    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<SuiteConfig> {
        if !path.exists() {
            return Ok(SuiteConfig::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return SuiteConfig::from_toml_str(&text);
    }

    pub fn validate(&self) -> Result<()> {
        if self.contenders.is_empty() {
            return Err(BenchError::Config("no contenders selected".into()));
        }
        if self.delta_size.trials == 0 || self.deletion_size.trials == 0 {
            return Err(BenchError::Config("trial counts must be > 0".into()));
        }
        if self.additions.rounds == 0 || self.merges.rounds == 0 {
            return Err(BenchError::Config("rounds must be > 0".into()));
        }
        if self.additions.batch == 0 {
            return Err(BenchError::Config("additions batch must be > 0".into()));
        }
        return Ok(());
    }
}
