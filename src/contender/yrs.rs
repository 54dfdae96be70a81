//! Yjs documents through `yrs`. Content lives in one root map whose values
//! are plain `Any` trees, the way JSON is usually stored in a `Y.Map`.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use yrs::Any;
use yrs::Doc;
use yrs::Map;
use yrs::MapRef;
use yrs::ReadTxn;
use yrs::StateVector;
use yrs::Transact;
use yrs::Update;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;

use super::BenchmarkEnvironment;
use super::Sizes;
use super::Thunk;
use super::byte_len;
use super::keyed_edit_path;
use super::labels;
use super::root_entries;
use super::with_edit;
use crate::error::BenchError;
use crate::error::Result;
use crate::fuzzer::Content;

const NAME: &str = "yrs";
const ROOT: &str = "root";

pub struct YrsEnv;

fn engine(err: impl Display) -> BenchError {
    return BenchError::engine(NAME, err);
}

fn to_any(value: &Content) -> Any {
    return match value {
        Content::Null => Any::Null,
        Content::Bool(b) => Any::Bool(*b),
        Content::Number(n) => Any::Number(n.as_f64().unwrap_or(f64::NAN)),
        Content::String(s) => Any::String(Arc::from(s.as_str())),
        Content::Array(items) => Any::Array(items.iter().map(to_any).collect()),
        Content::Object(children) => {
            let map: HashMap<String, Any> = children
                .iter()
                .map(|(key, child)| (key.clone(), to_any(child)))
                .collect();
            Any::Map(Arc::new(map))
        }
    };
}

fn build(values: &Content, client: u64) -> (Doc, MapRef) {
    let doc = Doc::with_client_id(client);
    let root = doc.get_or_insert_map(ROOT);
    {
        let mut txn = doc.transact_mut();
        for (key, value) in root_entries(values) {
            root.insert(&mut txn, key, to_any(&value));
        }
    }
    return (doc, root);
}

/// Encode what `to` is missing from `from`, decode it and apply it.
fn sync(from: &Doc, to: &Doc) -> Result<u64> {
    let sv = to.transact().state_vector();
    let bytes = from.transact().encode_state_as_update_v1(&sv);
    let update = Update::decode_v1(&bytes).map_err(engine)?;
    to.transact_mut().apply_update(update).map_err(engine)?;
    return Ok(byte_len(&bytes));
}

fn encoded_len(doc: &Doc) -> u64 {
    let bytes = doc
        .transact()
        .encode_state_as_update_v1(&StateVector::default());
    return byte_len(&bytes);
}

impl BenchmarkEnvironment for YrsEnv {
    fn name(&self) -> &'static str {
        return NAME;
    }

    fn test_delta_size(&self, first: Content, second: Content) -> Result<Sizes> {
        let (a, _) = build(&first, 1);
        let (b, b_root) = build(&second, 2);
        let mut sizes = Sizes::new();

        let sv = b.transact().state_vector().encode_v1();
        sizes.insert(labels::STATE_VECTOR.into(), byte_len(&sv));

        sizes.insert(labels::RANDOM_MERGE.into(), sync(&a, &b)?);
        sync(&b, &a)?;

        // The root entry holding the leaf is rewritten as a whole.
        let path = keyed_edit_path(&second);
        let (key, rest) = path.split_first().ok_or_else(|| engine("empty edit path"))?;
        let current = root_entries(&second)
            .into_iter()
            .find(|(existing, _)| existing == key)
            .map_or(Content::Null, |(_, value)| value);
        {
            let mut txn = b.transact_mut();
            b_root.insert(&mut txn, key.clone(), to_any(&with_edit(&current, rest)));
        }
        sizes.insert(labels::FIELD_CHANGE.into(), sync(&b, &a)?);

        {
            let mut txn = b.transact_mut();
            b_root.clear(&mut txn);
        }
        sizes.insert(labels::DELETE_ALL.into(), sync(&b, &a)?);
        return Ok(sizes);
    }

    fn test_size_after_deletion(&self, values: Content) -> Result<Sizes> {
        let (doc, root) = build(&values, 1);
        let mut sizes = Sizes::new();
        sizes.insert(labels::POPULATED.into(), encoded_len(&doc));

        {
            let mut txn = doc.transact_mut();
            root.clear(&mut txn);
        }
        sizes.insert(labels::DELETED.into(), encoded_len(&doc));
        return Ok(sizes);
    }

    fn test_crdt_size(&self, values: Content) -> Result<u64> {
        let (doc, _) = build(&values, 1);
        return Ok(encoded_len(&doc));
    }

    fn test_n_additions(&self, n: usize) -> Result<Thunk> {
        let doc = Doc::with_client_id(1);
        let root = doc.get_or_insert_map(ROOT);
        return Ok(Box::new(move || {
            let mut txn = doc.transact_mut();
            for i in 0..n {
                root.insert(&mut txn, format!("key-{i}"), Any::Number(i as f64));
            }
            return Ok(());
        }));
    }

    fn test_merge(&self, first: Content, second: Content) -> Result<Thunk> {
        let (a, _) = build(&first, 1);
        let (b, _) = build(&second, 2);
        return Ok(Box::new(move || {
            sync(&a, &b)?;
            sync(&b, &a)?;
            return Ok(());
        }));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn replicas_converge_after_exchange() {
        let (a, a_root) = build(&json!({"a": 1}), 1);
        let (b, b_root) = build(&json!({"b": {"c": true}}), 2);
        sync(&a, &b).unwrap();
        sync(&b, &a).unwrap();

        assert_eq!(a_root.len(&a.transact()), 2);
        assert_eq!(b_root.len(&b.transact()), 2);
    }

    #[test]
    fn delta_probe_reports_every_label() {
        let sizes = YrsEnv
            .test_delta_size(json!({"a": {"b": 1}}), json!({"c": 2}))
            .unwrap();
        for label in [
            labels::STATE_VECTOR,
            labels::RANDOM_MERGE,
            labels::FIELD_CHANGE,
            labels::DELETE_ALL,
        ] {
            assert!(sizes.contains_key(label), "missing {label}");
        }
    }

    #[test]
    fn values_map_onto_any() {
        assert_eq!(to_any(&json!(2)), Any::Number(2.0));
        assert_eq!(to_any(&json!("x")), Any::String(Arc::from("x")));
        assert_eq!(to_any(&json!(null)), Any::Null);
    }
}
