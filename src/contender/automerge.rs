//! Automerge documents. Deltas are the changes after the peer's heads, and
//! the state vector is the peer's heads themselves.

use std::fmt::Display;

use automerge::ActorId;
use automerge::AutoCommit;
use automerge::AutomergeError;
use automerge::ChangeHash;
use automerge::ObjId;
use automerge::ObjType;
use automerge::ROOT;
use automerge::ReadDoc;
use automerge::ScalarValue;
use automerge::Value;
use automerge::transaction::Transactable;

use super::BenchmarkEnvironment;
use super::EDITED;
use super::Sizes;
use super::Thunk;
use super::byte_len;
use super::keyed_edit_path;
use super::labels;
use super::root_entries;
use crate::error::BenchError;
use crate::error::Result;
use crate::fuzzer::Content;

const NAME: &str = "automerge";

/// Encoded length of one change hash.
const HASH_LEN: u64 = 32;

type AmResult<T> = std::result::Result<T, AutomergeError>;

pub struct AutomergeEnv;

fn engine(err: impl Display) -> BenchError {
    return BenchError::engine(NAME, err);
}

fn scalar(value: &Content) -> ScalarValue {
    return match value {
        Content::Bool(b) => ScalarValue::Boolean(*b),
        Content::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => ScalarValue::Int(i),
            (None, Some(u)) => ScalarValue::Uint(u),
            _ => ScalarValue::F64(n.as_f64().unwrap_or(f64::NAN)),
        },
        Content::String(s) => ScalarValue::from(s.as_str()),
        _ => ScalarValue::Null,
    };
}

fn container(value: &Content) -> Option<ObjType> {
    return match value {
        Content::Object(_) => Some(ObjType::Map),
        Content::Array(_) => Some(ObjType::List),
        _ => None,
    };
}

/// Write `value` under `key` of the map `obj`.
fn put(doc: &mut AutoCommit, obj: &ObjId, key: &str, value: &Content) -> AmResult<()> {
    let Some(kind) = container(value) else {
        return doc.put(obj, key, scalar(value));
    };
    let child = doc.put_object(obj, key, kind)?;
    return fill(doc, &child, value);
}

/// Populate a freshly created map or list.
fn fill(doc: &mut AutoCommit, obj: &ObjId, value: &Content) -> AmResult<()> {
    match value {
        Content::Object(children) => {
            for (key, child) in children {
                put(doc, obj, key, child)?;
            }
        }
        Content::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                match container(item) {
                    Some(kind) => {
                        let child = doc.insert_object(obj, index, kind)?;
                        fill(doc, &child, item)?;
                    }
                    None => doc.insert(obj, index, scalar(item))?,
                }
            }
        }
        _ => {}
    }
    return Ok(());
}

fn build(values: &Content, actor: u8) -> Result<AutoCommit> {
    let mut doc = AutoCommit::new().with_actor(ActorId::from(vec![actor]));
    for (key, value) in root_entries(values) {
        put(&mut doc, &ROOT, &key, &value).map_err(engine)?;
    }
    let _ = doc.commit();
    return Ok(doc);
}

/// Set the leaf at `path` to [`EDITED`], creating maps along the way.
fn edit(doc: &mut AutoCommit, path: &[String]) -> AmResult<()> {
    let Some((last, parents)) = path.split_last() else {
        return Ok(());
    };
    let mut obj = ROOT;
    for key in parents {
        let existing = match doc.get(&obj, key.as_str())? {
            Some((Value::Object(ObjType::Map), id)) => Some(id),
            _ => None,
        };
        obj = match existing {
            Some(id) => id,
            None => doc.put_object(&obj, key.as_str(), ObjType::Map)?,
        };
    }
    doc.put(&obj, last.as_str(), EDITED)?;
    let _ = doc.commit();
    return Ok(());
}

fn delete_all(doc: &mut AutoCommit) -> AmResult<()> {
    let keys: Vec<String> = doc.keys(ROOT).collect();
    for key in keys {
        doc.delete(ROOT, key.as_str())?;
    }
    let _ = doc.commit();
    return Ok(());
}

/// Changes in `from` after the heads a peer reports. Heads `from` has
/// never seen are dropped, which widens the delta to cover them.
fn changes_after(from: &mut AutoCommit, peer_heads: &[ChangeHash]) -> Vec<u8> {
    let known: Vec<ChangeHash> = peer_heads
        .iter()
        .filter(|hash| from.get_change_by_hash(hash).is_some())
        .copied()
        .collect();
    return from.save_after(&known);
}

/// Send `to` what it is missing from `from`; returns the encoded size.
fn sync(from: &mut AutoCommit, to: &mut AutoCommit) -> Result<u64> {
    let heads = to.get_heads();
    let bytes = changes_after(from, &heads);
    if !bytes.is_empty() {
        to.load_incremental(&bytes).map_err(engine)?;
    }
    return Ok(byte_len(&bytes));
}

fn non_empty(size: u64, transition: &'static str) -> Result<u64> {
    if size == 0 {
        return Err(BenchError::EmptyDelta {
            contender: NAME,
            transition,
        });
    }
    return Ok(size);
}

impl BenchmarkEnvironment for AutomergeEnv {
    fn name(&self) -> &'static str {
        return NAME;
    }

    fn test_delta_size(&self, first: Content, second: Content) -> Result<Sizes> {
        let mut a = build(&first, 1)?;
        let mut b = build(&second, 2)?;
        let mut sizes = Sizes::new();

        let heads = b.get_heads();
        sizes.insert(labels::STATE_VECTOR.into(), HASH_LEN * heads.len() as u64);

        sizes.insert(labels::RANDOM_MERGE.into(), sync(&mut a, &mut b)?);
        sync(&mut b, &mut a)?;

        edit(&mut b, &keyed_edit_path(&second)).map_err(engine)?;
        let changed = non_empty(sync(&mut b, &mut a)?, labels::FIELD_CHANGE)?;
        sizes.insert(labels::FIELD_CHANGE.into(), changed);

        delete_all(&mut b).map_err(engine)?;
        let deleted = non_empty(sync(&mut b, &mut a)?, labels::DELETE_ALL)?;
        sizes.insert(labels::DELETE_ALL.into(), deleted);
        return Ok(sizes);
    }

    fn test_size_after_deletion(&self, values: Content) -> Result<Sizes> {
        let mut doc = build(&values, 1)?;
        let mut sizes = Sizes::new();
        sizes.insert(labels::POPULATED.into(), byte_len(&doc.save()));

        delete_all(&mut doc).map_err(engine)?;
        sizes.insert(labels::DELETED.into(), byte_len(&doc.save()));
        return Ok(sizes);
    }

    fn test_crdt_size(&self, values: Content) -> Result<u64> {
        let mut doc = build(&values, 1)?;
        return Ok(byte_len(&doc.save()));
    }

    fn test_n_additions(&self, n: usize) -> Result<Thunk> {
        let mut doc = AutoCommit::new().with_actor(ActorId::from(vec![1u8]));
        return Ok(Box::new(move || {
            for i in 0..n {
                let key = format!("key-{i}");
                doc.put(ROOT, key.as_str(), ScalarValue::Uint(i as u64))
                    .map_err(engine)?;
            }
            let _ = doc.commit();
            return Ok(());
        }));
    }

    fn test_merge(&self, first: Content, second: Content) -> Result<Thunk> {
        let mut a = build(&first, 1)?;
        let mut b = build(&second, 2)?;
        return Ok(Box::new(move || {
            sync(&mut a, &mut b)?;
            sync(&mut b, &mut a)?;
            return Ok(());
        }));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::SCALAR_KEY;
    use super::*;

    #[test]
    fn converged_documents_match() {
        let mut a = build(&json!({"a": {"b": 1}}), 1).unwrap();
        let mut b = build(&json!({"c": [1, 2]}), 2).unwrap();
        sync(&mut a, &mut b).unwrap();
        sync(&mut b, &mut a).unwrap();

        assert_eq!(a.get_heads(), b.get_heads());
        assert_eq!(sync(&mut a, &mut b).unwrap(), 0);
    }

    #[test]
    fn state_vector_counts_heads() {
        let sizes = AutomergeEnv
            .test_delta_size(
                json!({"a": {"b": 1, "c": 2}, "d": 3, "e": 4}),
                json!({"f": {"g": 5}}),
            )
            .unwrap();
        assert!(sizes[labels::FIELD_CHANGE] > 0);
        assert_eq!(sizes[labels::STATE_VECTOR], HASH_LEN);
    }

    #[test]
    fn scalar_roots_are_keyed() {
        let doc = build(&json!(7), 1).unwrap();
        let keys: Vec<String> = doc.keys(ROOT).collect();
        assert_eq!(keys, vec![SCALAR_KEY.to_string()]);
        assert!(AutomergeEnv.test_crdt_size(json!(7)).unwrap() > 0);
    }
}
