//! Presence state kept in a shelf, one subtree per client. Unlike the Yjs
//! protocol, an edit sends only the changed path.

use shelf::Awareness;
use shelf::Shelf;
use shelf::ShelfError;

use super::BenchmarkEnvironment;
use super::EDITED;
use super::Sizes;
use super::Thunk;
use super::byte_len;
use super::edit_path;
use super::labels;
use crate::error::BenchError;
use crate::error::Result;
use crate::fuzzer::Content;

const NAME: &str = "shelf-awareness";

const FIRST: u64 = 1;
const SECOND: u64 = 2;

pub struct ShelfAwarenessEnv;

fn engine(err: ShelfError) -> BenchError {
    return BenchError::engine(NAME, err);
}

/// Ship what `to` is missing through the codec.
fn sync(from: &Awareness, to: &mut Awareness) -> Result<Option<u64>> {
    let Some(delta) = from.delta(&to.state_vector()) else {
        return Ok(None);
    };
    let bytes = delta.encode().map_err(engine)?;
    to.merge(Shelf::decode(&bytes).map_err(engine)?);
    return Ok(Some(byte_len(&bytes)));
}

impl BenchmarkEnvironment for ShelfAwarenessEnv {
    fn name(&self) -> &'static str {
        return NAME;
    }

    fn test_delta_size(&self, first: Content, second: Content) -> Result<Sizes> {
        let mut a = Awareness::with_state(FIRST, &first).map_err(engine)?;
        let mut b = Awareness::with_state(SECOND, &second).map_err(engine)?;
        let mut sizes = Sizes::new();

        let sv = b.state_vector().encode().map_err(engine)?;
        sizes.insert(labels::STATE_VECTOR.into(), byte_len(&sv));

        let merged = sync(&a, &mut b)?.unwrap_or(0);
        sizes.insert(labels::RANDOM_MERGE.into(), merged);
        sync(&b, &mut a)?;

        b.set(&edit_path(&second), &Content::from(EDITED))
            .map_err(engine)?;
        let changed = sync(&b, &mut a)?.ok_or(BenchError::EmptyDelta {
            contender: NAME,
            transition: labels::FIELD_CHANGE,
        })?;
        sizes.insert(labels::FIELD_CHANGE.into(), changed);

        b.clear_local_state().map_err(engine)?;
        let deleted = sync(&b, &mut a)?.ok_or(BenchError::EmptyDelta {
            contender: NAME,
            transition: labels::DELETE_ALL,
        })?;
        sizes.insert(labels::DELETE_ALL.into(), deleted);
        return Ok(sizes);
    }

    fn test_size_after_deletion(&self, values: Content) -> Result<Sizes> {
        let mut awareness = Awareness::with_state(FIRST, &values).map_err(engine)?;
        let mut sizes = Sizes::new();

        let populated = awareness.encode().map_err(engine)?;
        sizes.insert(labels::POPULATED.into(), byte_len(&populated));

        awareness.clear_local_state().map_err(engine)?;
        let deleted = awareness.encode().map_err(engine)?;
        sizes.insert(labels::DELETED.into(), byte_len(&deleted));
        return Ok(sizes);
    }

    fn test_crdt_size(&self, values: Content) -> Result<u64> {
        let awareness = Awareness::with_state(FIRST, &values).map_err(engine)?;
        return Ok(byte_len(&awareness.encode().map_err(engine)?));
    }

    fn test_n_additions(&self, n: usize) -> Result<Thunk> {
        let mut awareness =
            Awareness::with_state(FIRST, &Content::Object(Default::default())).map_err(engine)?;
        return Ok(Box::new(move || {
            for i in 0..n {
                let key = format!("key-{i}");
                awareness.set(&[key], &Content::from(i)).map_err(engine)?;
            }
            return Ok(());
        }));
    }

    fn test_merge(&self, first: Content, second: Content) -> Result<Thunk> {
        let mut a = Awareness::with_state(FIRST, &first).map_err(engine)?;
        let mut b = Awareness::with_state(SECOND, &second).map_err(engine)?;
        return Ok(Box::new(move || {
            sync(&a, &mut b)?;
            sync(&b, &mut a)?;
            return Ok(());
        }));
    }
}
