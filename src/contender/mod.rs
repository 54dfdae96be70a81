//! The benchmark contract and the registry of contenders.
//!
//! Each contender adapts one CRDT engine to the five probes of
//! [`BenchmarkEnvironment`]. The runners only ever talk to the trait, so
//! adding an engine means adding a module here and a [`ContenderKind`]
//! variant.
//!
//! All size probes measure encoded bytes: whatever the engine would put on
//! the wire or on disk.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::BenchError;
use crate::error::Probe;
use crate::error::Result;
use crate::fuzzer::Content;

mod automerge;
mod awareness;
mod shelf;
mod shelf_awareness;
mod yrs;

pub use self::automerge::AutomergeEnv;
pub use self::awareness::AwarenessEnv;
pub use self::shelf::ShelfEnv;
pub use self::shelf_awareness::ShelfAwarenessEnv;
pub use self::yrs::YrsEnv;

/// Metric label to encoded byte size.
pub type Sizes = BTreeMap<String, u64>;

/// A deferred operation; one call is one timed unit of work.
pub type Thunk = Box<dyn FnMut() -> Result<()>>;

/// Labels reported by the size probes.
pub mod labels {
    /// Update one replica sends another built from an unrelated tree.
    pub const RANDOM_MERGE: &str = "random_merge";
    /// Update after changing a single leaf on converged replicas.
    pub const FIELD_CHANGE: &str = "field_change";
    /// Update after deleting all content on converged replicas.
    pub const DELETE_ALL: &str = "delete_all";
    /// Encoded state summary of the receiving replica.
    pub const STATE_VECTOR: &str = "state_vector";
    pub const POPULATED: &str = "populated";
    pub const DELETED: &str = "deleted";
}

/// The value written by the field-change transition.
pub const EDITED: &str = "edited";

/// Map-based engines store a bare scalar tree under this root key.
pub const SCALAR_KEY: &str = "value";

/// The capability set every contender provides.
///
/// Probes take their input trees by value: each contender gets its own
/// copy and cannot disturb what the next contender sees. Every probe has a
/// default that fails with [`BenchError::Unimplemented`], so a missing
/// probe stops the run instead of silently dropping out of a comparison.
pub trait BenchmarkEnvironment {
    fn name(&self) -> &'static str;

    /// Build replicas from `first` and `second`, then measure the update
    /// sizes of a random merge, a single field change and a full deletion.
    fn test_delta_size(&self, _first: Content, _second: Content) -> Result<Sizes> {
        return Err(unimplemented(self.name(), Probe::DeltaSize));
    }

    /// Encoded size before and after deleting all of `values`.
    fn test_size_after_deletion(&self, _values: Content) -> Result<Sizes> {
        return Err(unimplemented(self.name(), Probe::SizeAfterDeletion));
    }

    /// Encoded size of a replica populated from `values`.
    fn test_crdt_size(&self, _values: Content) -> Result<u64> {
        return Err(unimplemented(self.name(), Probe::CrdtSize));
    }

    /// Set up an empty replica; the thunk writes keys `key-0..key-{n-1}`.
    fn test_n_additions(&self, _n: usize) -> Result<Thunk> {
        return Err(unimplemented(self.name(), Probe::NAdditions));
    }

    /// Set up two diverged replicas; the thunk exchanges updates both
    /// ways and merges them.
    fn test_merge(&self, _first: Content, _second: Content) -> Result<Thunk> {
        return Err(unimplemented(self.name(), Probe::Merge));
    }
}

fn unimplemented(contender: &'static str, probe: Probe) -> BenchError {
    return BenchError::Unimplemented { contender, probe };
}

/// Every engine the harness knows how to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContenderKind {
    Automerge,
    Yrs,
    Awareness,
    ShelfAwareness,
    Shelf,
    DotShelf,
    SecureShelf,
}

impl ContenderKind {
    pub const ALL: [ContenderKind; 7] = [
        ContenderKind::Automerge,
        ContenderKind::Yrs,
        ContenderKind::Awareness,
        ContenderKind::ShelfAwareness,
        ContenderKind::Shelf,
        ContenderKind::DotShelf,
        ContenderKind::SecureShelf,
    ];

    pub fn environment(self) -> Box<dyn BenchmarkEnvironment> {
        return match self {
            ContenderKind::Automerge => Box::new(AutomergeEnv),
            ContenderKind::Yrs => Box::new(YrsEnv),
            ContenderKind::Awareness => Box::new(AwarenessEnv),
            ContenderKind::ShelfAwareness => Box::new(ShelfAwarenessEnv),
            ContenderKind::Shelf => Box::new(ShelfEnv::lamport()),
            ContenderKind::DotShelf => Box::new(ShelfEnv::dot()),
            ContenderKind::SecureShelf => Box::new(ShelfEnv::secure()),
        };
    }
}

/// Build the environments for `kinds`, in order.
pub fn environments(kinds: &[ContenderKind]) -> Vec<Box<dyn BenchmarkEnvironment>> {
    return kinds.iter().map(|kind| kind.environment()).collect();
}

// =============================================================================
// Content helpers shared by the adapters
// =============================================================================

/// Top-level entries of a tree; a bare scalar becomes one entry under
/// [`SCALAR_KEY`].
pub fn root_entries(content: &Content) -> Vec<(String, Content)> {
    return match content {
        Content::Object(children) => children
            .iter()
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect(),
        scalar => vec![(SCALAR_KEY.to_string(), scalar.clone())],
    };
}

/// Path of the leaf the field-change transition edits: the first leaf in
/// key order, the empty path for a bare scalar, or a new root key when the
/// tree has no leaves at all.
pub fn edit_path(content: &Content) -> Vec<String> {
    return first_leaf(content).unwrap_or_else(|| vec![EDITED.to_string()]);
}

fn first_leaf(content: &Content) -> Option<Vec<String>> {
    let Content::Object(children) = content else {
        return Some(Vec::new());
    };
    return children.iter().find_map(|(key, child)| {
        let mut path = match child {
            Content::Object(_) => first_leaf(child)?,
            _ => Vec::new(),
        };
        path.insert(0, key.clone());
        return Some(path);
    });
}

/// [`edit_path`] for engines whose root is always a map.
pub fn keyed_edit_path(content: &Content) -> Vec<String> {
    let path = edit_path(content);
    if path.is_empty() {
        return vec![SCALAR_KEY.to_string()];
    }
    return path;
}

/// A copy of `content` with the leaf at `path` replaced by [`EDITED`].
/// Missing intermediate maps are created.
pub fn with_edit(content: &Content, path: &[String]) -> Content {
    let Some((key, rest)) = path.split_first() else {
        return Content::from(EDITED);
    };
    let mut children = match content {
        Content::Object(children) => children.clone(),
        _ => serde_json::Map::new(),
    };
    let child = children.get(key).cloned().unwrap_or(Content::Null);
    children.insert(key.clone(), with_edit(&child, rest));
    return Content::Object(children);
}

#[inline]
fn byte_len(bytes: &[u8]) -> u64 {
    return bytes.len() as u64;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Partial;

    impl BenchmarkEnvironment for Partial {
        fn name(&self) -> &'static str {
            return "partial";
        }

        fn test_crdt_size(&self, _values: Content) -> Result<u64> {
            return Ok(7);
        }
    }

    #[test]
    fn missing_probes_fail_loudly() {
        let env = Partial;
        assert_eq!(env.test_crdt_size(json!({})).unwrap(), 7);

        let err = env.test_merge(json!({}), json!({})).err().unwrap();
        assert!(matches!(
            err,
            BenchError::Unimplemented {
                contender: "partial",
                probe: Probe::Merge
            }
        ));
        assert_eq!(err.to_string(), "partial does not implement test_merge");
    }

    #[test]
    fn registry_names_are_distinct() {
        let names: Vec<&str> = environments(&ContenderKind::ALL)
            .iter()
            .map(|env| env.name())
            .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn registry_names_match_config_names() {
        for kind in ContenderKind::ALL {
            let config_name = serde_json::to_value(kind).unwrap();
            assert_eq!(config_name, kind.environment().name());
        }
    }

    #[test]
    fn edit_path_finds_first_leaf() {
        let tree = json!({"a": {}, "b": {"c": 2, "z": 1}});
        assert_eq!(edit_path(&tree), vec!["b", "c"]);
        assert_eq!(edit_path(&json!(4)), Vec::<String>::new());
        assert_eq!(edit_path(&json!({"a": {}})), vec![EDITED]);
        assert_eq!(keyed_edit_path(&json!(4)), vec![SCALAR_KEY]);
    }

    #[test]
    fn with_edit_replaces_one_leaf() {
        let tree = json!({"a": {"b": 1, "c": 2}});
        let path = edit_path(&tree);
        assert_eq!(with_edit(&tree, &path), json!({"a": {"b": EDITED, "c": 2}}));
        assert_eq!(with_edit(&json!(3), &[]), json!(EDITED));
    }

    #[test]
    fn scalar_trees_get_a_root_key() {
        assert_eq!(root_entries(&json!(3)), vec![(SCALAR_KEY.to_string(), json!(3))]);
        assert!(root_entries(&json!({})).is_empty());
    }
}
