//! Presence state through the Yjs awareness protocol (`yrs::sync`). Each
//! client publishes its whole state as JSON text under a per-client clock,
//! so every edit resends the full state; removal publishes a `null`.

use std::fmt::Display;

use serde_json::Map;
use yrs::Doc;
use yrs::encoding::write::Write;
use yrs::sync::Awareness;
use yrs::sync::AwarenessUpdate;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::updates::encoder::Encoder;
use yrs::updates::encoder::EncoderV1;

use super::BenchmarkEnvironment;
use super::Sizes;
use super::Thunk;
use super::byte_len;
use super::edit_path;
use super::labels;
use super::with_edit;
use crate::error::BenchError;
use crate::error::Result;
use crate::fuzzer::Content;

const NAME: &str = "awareness";

const FIRST: u64 = 1;
const SECOND: u64 = 2;

pub struct AwarenessEnv;

fn engine(err: impl Display) -> BenchError {
    return BenchError::engine(NAME, err);
}

fn client(id: u64, state: &Content) -> Result<Awareness> {
    let awareness = Awareness::new(Doc::with_client_id(id));
    awareness.set_local_state(state).map_err(engine)?;
    return Ok(awareness);
}

/// Per-client clocks `awareness` has seen.
fn known_clocks(awareness: &Awareness) -> Vec<(u64, u32)> {
    let mut clocks: Vec<(u64, u32)> = awareness
        .iter()
        .map(|(id, state)| (id, state.clock))
        .collect();
    clocks.sort_unstable();
    return clocks;
}

/// lib0 encoding of the known clocks, the awareness counterpart of a
/// document state vector.
fn encode_clocks(clocks: &[(u64, u32)]) -> Vec<u8> {
    let mut encoder = EncoderV1::new();
    encoder.write_var(clocks.len());
    for (id, clock) in clocks {
        encoder.write_var(*id);
        encoder.write_var(*clock);
    }
    return encoder.to_vec();
}

/// Send `to` the client entries newer than it has seen, through the v1
/// codec. Returns the encoded size, or `None` when `to` is up to date.
fn sync(from: &Awareness, to: &Awareness) -> Result<Option<u64>> {
    let known = known_clocks(to);
    let newer: Vec<u64> = known_clocks(from)
        .into_iter()
        .filter(|(id, clock)| {
            let seen = known.iter().find(|(known_id, _)| known_id == id);
            return seen.is_none_or(|(_, known_clock)| clock > known_clock);
        })
        .map(|(id, _)| id)
        .collect();
    if newer.is_empty() {
        return Ok(None);
    }
    let bytes = from.update_with_clients(newer).map_err(engine)?.encode_v1();
    let update = AwarenessUpdate::decode_v1(&bytes).map_err(engine)?;
    to.apply_update(update).map_err(engine)?;
    return Ok(Some(byte_len(&bytes)));
}

/// The local entry as a peer would receive it, tombstone included.
fn local_entry(awareness: &Awareness) -> Result<Vec<u8>> {
    let update = awareness
        .update_with_clients([awareness.client_id()])
        .map_err(engine)?;
    return Ok(update.encode_v1());
}

impl BenchmarkEnvironment for AwarenessEnv {
    fn name(&self) -> &'static str {
        return NAME;
    }

    fn test_delta_size(&self, first: Content, second: Content) -> Result<Sizes> {
        let a = client(FIRST, &first)?;
        let b = client(SECOND, &second)?;
        let mut sizes = Sizes::new();

        let sv = encode_clocks(&known_clocks(&b));
        sizes.insert(labels::STATE_VECTOR.into(), byte_len(&sv));

        let merged = sync(&a, &b)?.unwrap_or(0);
        sizes.insert(labels::RANDOM_MERGE.into(), merged);
        sync(&b, &a)?;

        let edited = with_edit(&second, &edit_path(&second));
        b.set_local_state(&edited).map_err(engine)?;
        let changed = sync(&b, &a)?.ok_or(BenchError::EmptyDelta {
            contender: NAME,
            transition: labels::FIELD_CHANGE,
        })?;
        sizes.insert(labels::FIELD_CHANGE.into(), changed);

        b.clean_local_state();
        let deleted = sync(&b, &a)?.ok_or(BenchError::EmptyDelta {
            contender: NAME,
            transition: labels::DELETE_ALL,
        })?;
        sizes.insert(labels::DELETE_ALL.into(), deleted);
        return Ok(sizes);
    }

    fn test_size_after_deletion(&self, values: Content) -> Result<Sizes> {
        let awareness = client(FIRST, &values)?;
        let mut sizes = Sizes::new();
        sizes.insert(labels::POPULATED.into(), byte_len(&local_entry(&awareness)?));

        awareness.clean_local_state();
        sizes.insert(labels::DELETED.into(), byte_len(&local_entry(&awareness)?));
        return Ok(sizes);
    }

    fn test_crdt_size(&self, values: Content) -> Result<u64> {
        let awareness = client(FIRST, &values)?;
        let update = awareness.update().map_err(engine)?;
        return Ok(byte_len(&update.encode_v1()));
    }

    /// The protocol only publishes whole states, so one call builds the
    /// `n` keys and publishes them once.
    fn test_n_additions(&self, n: usize) -> Result<Thunk> {
        let awareness = Awareness::new(Doc::with_client_id(FIRST));
        return Ok(Box::new(move || {
            let mut state = Map::new();
            for i in 0..n {
                state.insert(format!("key-{i}"), Content::from(i));
            }
            awareness.set_local_state(Content::Object(state)).map_err(engine)?;
            return Ok(());
        }));
    }

    fn test_merge(&self, first: Content, second: Content) -> Result<Thunk> {
        let a = client(FIRST, &first)?;
        let b = client(SECOND, &second)?;
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
    fn crdt_size_is_the_yjs_update() {
        let tree = json!({"a": {"b": 1, "c": 2}, "d": 3});
        let awareness = Awareness::new(Doc::with_client_id(FIRST));
        awareness.set_local_state(&tree).unwrap();
        let expected = awareness.update().unwrap().encode_v1();

        assert_eq!(AwarenessEnv.test_crdt_size(tree).unwrap(), byte_len(&expected));
    }

    #[test]
    fn sync_reaches_the_peer() {
        let a = client(FIRST, &json!({"x": 1})).unwrap();
        let b = client(SECOND, &json!("y")).unwrap();

        assert!(sync(&a, &b).unwrap().is_some());
        assert_eq!(b.state::<Content>(FIRST), Some(json!({"x": 1})));
        assert_eq!(sync(&a, &b).unwrap(), None);
    }

    #[test]
    fn field_change_resends_the_whole_state() {
        let second = json!({"a": 1, "b": "some longer text"});
        let sizes = AwarenessEnv.test_delta_size(json!({"x": 1}), second).unwrap();
        assert!(sizes[labels::FIELD_CHANGE] > sizes[labels::DELETE_ALL]);
    }

    #[test]
    fn deletion_leaves_a_tombstone() {
        let sizes = AwarenessEnv.test_size_after_deletion(json!({"a": [1, 2]})).unwrap();
        assert!(sizes[labels::DELETED] > 0);
        assert!(sizes[labels::DELETED] < sizes[labels::POPULATED]);
    }

    #[test]
    fn removal_replicates() {
        let a = client(FIRST, &json!({"x": 1})).unwrap();
        let b = client(SECOND, &json!({})).unwrap();
        sync(&a, &b).unwrap();

        a.clean_local_state();
        assert!(sync(&a, &b).unwrap().is_some());
        assert_eq!(b.state::<Content>(FIRST), None);
    }
}
