//! The shelf engines, once per clock flavour.

use std::marker::PhantomData;

use shelf::Clock;
use shelf::DotClock;
use shelf::LamportClock;
use shelf::SecureClock;
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

const FIRST: u64 = 1;
const SECOND: u64 = 2;

pub struct ShelfEnv<C> {
    name: &'static str,
    clock: PhantomData<C>,
}

impl ShelfEnv<LamportClock> {
    pub fn lamport() -> ShelfEnv<LamportClock> {
        return ShelfEnv {
            name: "shelf",
            clock: PhantomData,
        };
    }
}

impl ShelfEnv<DotClock> {
    pub fn dot() -> ShelfEnv<DotClock> {
        return ShelfEnv {
            name: "dot-shelf",
            clock: PhantomData,
        };
    }
}

impl ShelfEnv<SecureClock> {
    pub fn secure() -> ShelfEnv<SecureClock> {
        return ShelfEnv {
            name: "secure-shelf",
            clock: PhantomData,
        };
    }
}

fn engine(name: &'static str) -> impl Fn(ShelfError) -> BenchError {
    return move |err| BenchError::engine(name, err);
}

/// Send what `to` is missing from `from` through the codec and merge it.
/// Returns the encoded size, or `None` when there was nothing to send.
fn sync<C: Clock>(name: &'static str, from: &Shelf<C>, to: &mut Shelf<C>) -> Result<Option<u64>> {
    let Some(delta) = from.delta(&to.state_vector()) else {
        return Ok(None);
    };
    let bytes = delta.encode().map_err(engine(name))?;
    let decoded = Shelf::decode(&bytes).map_err(engine(name))?;
    to.merge(decoded);
    to.garbage_collect();
    return Ok(Some(byte_len(&bytes)));
}

impl<C: Clock + 'static> BenchmarkEnvironment for ShelfEnv<C> {
    fn name(&self) -> &'static str {
        return self.name;
    }

    fn test_delta_size(&self, first: Content, second: Content) -> Result<Sizes> {
        let name = self.name;
        let mut a = Shelf::<C>::from_json(&first, FIRST).map_err(engine(name))?;
        let mut b = Shelf::<C>::from_json(&second, SECOND).map_err(engine(name))?;
        let mut sizes = Sizes::new();

        let sv = b.state_vector().encode().map_err(engine(name))?;
        sizes.insert(labels::STATE_VECTOR.into(), byte_len(&sv));

        // Identical replicas have nothing to send.
        let merged = sync(name, &a, &mut b)?.unwrap_or(0);
        sizes.insert(labels::RANDOM_MERGE.into(), merged);
        sync(name, &b, &mut a)?;

        b.set(&edit_path(&second), &Content::from(EDITED), SECOND)
            .map_err(engine(name))?;
        let changed = sync(name, &b, &mut a)?.ok_or(BenchError::EmptyDelta {
            contender: name,
            transition: labels::FIELD_CHANGE,
        })?;
        sizes.insert(labels::FIELD_CHANGE.into(), changed);

        b.clear(SECOND);
        let deleted = sync(name, &b, &mut a)?.ok_or(BenchError::EmptyDelta {
            contender: name,
            transition: labels::DELETE_ALL,
        })?;
        sizes.insert(labels::DELETE_ALL.into(), deleted);
        return Ok(sizes);
    }

    fn test_size_after_deletion(&self, values: Content) -> Result<Sizes> {
        let name = self.name;
        let mut shelf = Shelf::<C>::from_json(&values, FIRST).map_err(engine(name))?;
        let mut sizes = Sizes::new();

        let populated = shelf.encode().map_err(engine(name))?;
        sizes.insert(labels::POPULATED.into(), byte_len(&populated));

        shelf.clear(FIRST);
        shelf.garbage_collect();
        let deleted = shelf.encode().map_err(engine(name))?;
        sizes.insert(labels::DELETED.into(), byte_len(&deleted));
        return Ok(sizes);
    }

    fn test_crdt_size(&self, values: Content) -> Result<u64> {
        let shelf = Shelf::<C>::from_json(&values, FIRST).map_err(engine(self.name))?;
        let bytes = shelf.encode().map_err(engine(self.name))?;
        return Ok(byte_len(&bytes));
    }

    fn test_n_additions(&self, n: usize) -> Result<Thunk> {
        let name = self.name;
        let mut shelf = Shelf::<C>::default();
        return Ok(Box::new(move || {
            for i in 0..n {
                let key = format!("key-{i}");
                shelf
                    .set(&[key], &Content::from(i), FIRST)
                    .map_err(engine(name))?;
            }
            return Ok(());
        }));
    }

    fn test_merge(&self, first: Content, second: Content) -> Result<Thunk> {
        let name = self.name;
        let mut a = Shelf::<C>::from_json(&first, FIRST).map_err(engine(name))?;
        let mut b = Shelf::<C>::from_json(&second, SECOND).map_err(engine(name))?;
        return Ok(Box::new(move || {
            sync(name, &a, &mut b)?;
            sync(name, &b, &mut a)?;
            return Ok(());
        }));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn field_change_sends_one_leaf() {
        let env = ShelfEnv::lamport();
        let sizes = env
            .test_delta_size(
                json!({"a": {"b": 1, "c": 2}, "d": 3}),
                json!({"a": {"b": 4, "e": 5}}),
            )
            .unwrap();

        assert!(sizes[labels::RANDOM_MERGE] > 0);
        assert!(sizes[labels::FIELD_CHANGE] < sizes[labels::RANDOM_MERGE]);
        assert!(sizes[labels::DELETE_ALL] > 0);
    }

    #[test]
    fn identical_replicas_merge_nothing() {
        let env = ShelfEnv::dot();
        let tree = json!({"a": 1});
        let sizes = env.test_delta_size(tree.clone(), tree).unwrap();
        assert_eq!(sizes[labels::RANDOM_MERGE], 0);
    }

    #[test]
    fn deletion_shrinks_the_encoding() {
        let env = ShelfEnv::lamport();
        let sizes = env
            .test_size_after_deletion(json!({"a": {"b": "long text value"}, "c": [1, 2, 3]}))
            .unwrap();
        assert!(sizes[labels::DELETED] < sizes[labels::POPULATED]);
    }

    #[test]
    fn merge_thunk_converges() {
        let env = ShelfEnv::dot();
        let mut thunk = env.test_merge(json!({"a": 1}), json!({"b": 2})).unwrap();
        thunk().unwrap();
        thunk().unwrap();
    }

    #[test]
    fn secure_replicas_exchange_conflicting_values() {
        let (first, second) = (json!({"a": 1}), json!({"a": 2}));
        let lamport = ShelfEnv::lamport()
            .test_delta_size(first.clone(), second.clone())
            .unwrap();
        let secure = ShelfEnv::secure().test_delta_size(first, second).unwrap();

        assert_eq!(lamport[labels::RANDOM_MERGE], 0);
        assert!(secure[labels::RANDOM_MERGE] > 0);
    }

    #[test]
    fn objects_in_arrays_are_engine_errors() {
        let env = ShelfEnv::lamport();
        let err = env.test_crdt_size(json!({"a": [{"b": 1}]})).unwrap_err();
        assert!(matches!(err, BenchError::Engine { contender: "shelf", .. }));
    }
}
