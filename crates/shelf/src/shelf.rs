//! The shelf CRDT: a JSON-shaped tree where every node carries a clock.
//!
//! A write replaces a whole subtree and stamps it with a clock one past
//! everything it overwrites, so the newest write wins wholesale when
//! replicas merge. Maps whose clocks do not order are merged key by key.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

use crate::clock::Clock;
use crate::error::Result;
use crate::error::ShelfError;
use crate::value::Value;

/// A node of the shelf tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shelf<C> {
    Value { value: Value, clock: C },
    Map { shelves: BTreeMap<String, Shelf<C>>, clock: C },
}

impl<C: Clock> Default for Shelf<C> {
    fn default() -> Self {
        return Shelf::Map {
            shelves: BTreeMap::new(),
            clock: C::origin(0),
        };
    }
}

impl<C: Clock> Shelf<C> {
    /// Build a replica for `client` from plain JSON. Every node gets the
    /// client's origin clock.
    pub fn from_json(json: &Json, client: u64) -> Result<Shelf<C>> {
        return Shelf::with_clock(json, C::origin(client));
    }

    fn with_clock(json: &Json, clock: C) -> Result<Shelf<C>> {
        let shelf = match json {
            Json::Object(map) => {
                let mut shelves = BTreeMap::new();
                for (key, child) in map {
                    shelves.insert(key.clone(), Shelf::with_clock(child, clock)?);
                }
                Shelf::Map { shelves, clock }
            }
            leaf => {
                let value = Value::from_json(leaf)?;
                Shelf::Value {
                    clock: clock.stamp(&value),
                    value,
                }
            }
        };
        return Ok(shelf);
    }

    /// Strip clocks and return the plain JSON content.
    pub fn to_json(&self) -> Json {
        return match self {
            Shelf::Value { value, .. } => value.to_json(),
            Shelf::Map { shelves, .. } => Json::Object(
                shelves
                    .iter()
                    .map(|(key, shelf)| (key.clone(), shelf.to_json()))
                    .collect(),
            ),
        };
    }

    #[inline]
    pub fn clock(&self) -> C {
        return match self {
            Shelf::Value { clock, .. } | Shelf::Map { clock, .. } => *clock,
        };
    }

    /// Highest counter anywhere in this subtree.
    pub fn max_counter(&self) -> u64 {
        return match self {
            Shelf::Value { clock, .. } => clock.counter(),
            Shelf::Map { shelves, clock } => shelves
                .values()
                .map(Shelf::max_counter)
                .fold(clock.counter(), u64::max),
        };
    }

    pub fn get(&self, key: &str) -> Option<&Shelf<C>> {
        return match self {
            Shelf::Map { shelves, .. } => shelves.get(key),
            Shelf::Value { .. } => None,
        };
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Shelf<C>> {
        return match self {
            Shelf::Map { shelves, .. } => shelves.get_mut(key),
            Shelf::Value { .. } => None,
        };
    }

    /// Write `json` at `path`. An empty path replaces the whole replica.
    ///
    /// The new subtree is clocked one past the larger of the parent's
    /// counter and the highest counter in the subtree it replaces.
    pub fn set<P: AsRef<str>>(&mut self, path: &[P], json: &Json, client: u64) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            let clock = C::after(self.max_counter(), client);
            *self = Shelf::with_clock(json, clock)?;
            return Ok(());
        };

        let mut parent = self;
        for key in parents {
            let key = key.as_ref();
            parent = parent
                .get_mut(key)
                .ok_or_else(|| ShelfError::KeyNotFound(key.to_string()))?;
        }

        let parent_counter = parent.clock().counter();
        let Shelf::Map { shelves, .. } = parent else {
            return Err(ShelfError::NotAMap(last.as_ref().to_string()));
        };
        let floor = shelves
            .get(last.as_ref())
            .map_or(parent_counter, |old| old.max_counter().max(parent_counter));
        let shelf = Shelf::with_clock(json, C::after(floor, client))?;
        shelves.insert(last.as_ref().to_string(), shelf);
        return Ok(());
    }

    /// Delete everything by replacing the root with an empty map that
    /// outranks every clock in the tree.
    pub fn clear(&mut self, client: u64) {
        *self = Shelf::Map {
            shelves: BTreeMap::new(),
            clock: C::after(self.max_counter(), client),
        };
    }

    /// Which of two nodes survives a merge. Clocks decide first; on equal
    /// or concurrent clocks maps beat values, two values compare by value,
    /// and two maps do not compare (they merge key by key).
    pub fn precedence(&self, other: &Shelf<C>) -> Option<Ordering> {
        let by_clock = self.clock().partial_cmp(&other.clock());
        if let Some(Ordering::Less | Ordering::Greater) = by_clock {
            return by_clock;
        }
        return match (self, other) {
            (Shelf::Map { .. }, Shelf::Map { .. }) => None,
            (Shelf::Map { .. }, Shelf::Value { .. }) => Some(Ordering::Greater),
            (Shelf::Value { .. }, Shelf::Map { .. }) => Some(Ordering::Less),
            (Shelf::Value { value: a, .. }, Shelf::Value { value: b, .. }) => a.partial_cmp(b),
        };
    }

    /// Merge another replica (or a delta) into this one.
    pub fn merge(&mut self, other: Shelf<C>) {
        let by_clock = self.clock().partial_cmp(&other.clock());
        let ordered = matches!(by_clock, Some(Ordering::Less | Ordering::Greater));

        match (self, other) {
            (
                Shelf::Map { shelves, clock },
                Shelf::Map {
                    shelves: incoming,
                    clock: incoming_clock,
                },
            ) if !ordered => {
                for (key, shelf) in incoming {
                    match shelves.entry(key) {
                        Entry::Occupied(mut entry) => entry.get_mut().merge(shelf),
                        Entry::Vacant(entry) => {
                            entry.insert(shelf);
                        }
                    }
                }
                if incoming_clock.tiebreak() > clock.tiebreak() {
                    *clock = incoming_clock;
                }
            }
            // Incomparable floats (NaN) keep the local value.
            (this, other) => {
                if other.precedence(this) == Some(Ordering::Greater) {
                    *this = other;
                }
            }
        }
    }

    /// Drop map entries clocked strictly below their parent map; they
    /// can only have been overwritten.
    pub fn garbage_collect(&mut self) {
        let Shelf::Map { shelves, clock } = self else {
            return;
        };
        let parent = *clock;
        shelves.retain(|_, shelf| !(shelf.clock() < parent));
        for shelf in shelves.values_mut() {
            shelf.garbage_collect();
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        return Ok(bincode::serialize(self)?);
    }

    pub fn decode(bytes: &[u8]) -> Result<Shelf<C>> {
        return Ok(bincode::deserialize(bytes)?);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::clock::DotClock;
    use crate::clock::LamportClock;
    use crate::clock::SecureClock;

    type Lamport = Shelf<LamportClock>;
    type Dot = Shelf<DotClock>;
    type Secure = Shelf<SecureClock>;

    #[test]
    fn json_round_trip_strips_clocks() {
        let json = json!({"user": {"name": "ada", "age": 3}, "flag": true});
        let shelf = Lamport::from_json(&json, 1).unwrap();
        assert_eq!(shelf.to_json(), json);
    }

    #[test]
    fn set_clocks_past_replaced_subtree() {
        let mut shelf = Lamport::from_json(&json!({"a": {"b": 1}}), 1).unwrap();
        shelf.set(&["a", "b"], &json!(2), 1).unwrap();
        shelf.set(&["a"], &json!("flat"), 1).unwrap();

        let a = shelf.get("a").unwrap();
        assert_eq!(a.clock().counter(), 2);
        assert_eq!(shelf.to_json(), json!({"a": "flat"}));
    }

    #[test]
    fn set_rejects_missing_parent() {
        let mut shelf = Lamport::from_json(&json!({"a": 1}), 1).unwrap();
        assert!(matches!(
            shelf.set(&["missing", "b"], &json!(1), 1),
            Err(ShelfError::KeyNotFound(_))
        ));
        assert!(matches!(
            shelf.set(&["a", "b"], &json!(1), 1),
            Err(ShelfError::NotAMap(_))
        ));
    }

    #[test]
    fn newer_write_wins_merge() {
        let base = json!({"a": 1, "b": 2});
        let mut left = Lamport::from_json(&base, 1).unwrap();
        let mut right = left.clone();
        right.set(&["a"], &json!(10), 2).unwrap();

        left.merge(right);
        assert_eq!(left.to_json(), json!({"a": 10, "b": 2}));
    }

    #[test]
    fn concurrent_maps_merge_by_key() {
        let mut left = Dot::from_json(&json!({"a": 1}), 1).unwrap();
        let right = Dot::from_json(&json!({"b": 2}), 2).unwrap();

        left.merge(right);
        assert_eq!(left.to_json(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_is_commutative_for_concurrent_values() {
        let a = Dot::from_json(&json!({"k": 1, "m": {"x": "p"}}), 1).unwrap();
        let b = Dot::from_json(&json!({"k": 5, "m": 3}), 2).unwrap();

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab.to_json(), ba.to_json());
        assert_eq!(ab.to_json(), json!({"k": 5, "m": {"x": "p"}}));
    }

    #[test]
    fn clear_outranks_everything() {
        let mut left = Lamport::from_json(&json!({"a": {"b": {"c": 1}}}), 1).unwrap();
        let mut right = left.clone();
        right.set(&["a", "b", "c"], &json!(2), 2).unwrap();
        right.clear(2);

        left.merge(right);
        assert_eq!(left.to_json(), json!({}));
    }

    #[test]
    fn garbage_collect_drops_stale_children() {
        let mut shelf = Lamport::Map {
            shelves: BTreeMap::from([
                (
                    "old".to_string(),
                    Lamport::Value {
                        value: Value::Int(1),
                        clock: LamportClock::with_time(0),
                    },
                ),
                (
                    "new".to_string(),
                    Lamport::Value {
                        value: Value::Int(2),
                        clock: LamportClock::with_time(3),
                    },
                ),
            ]),
            clock: LamportClock::with_time(2),
        };

        shelf.garbage_collect();
        assert_eq!(shelf.to_json(), json!({"new": 2}));
    }

    #[test]
    fn secure_leaves_carry_value_hashes() {
        let mut shelf = Secure::from_json(&json!({"a": {"b": "x"}}), 1).unwrap();
        shelf.set(&["a", "b"], &json!("y"), 1).unwrap();

        let Some(Shelf::Value { value, clock }) = shelf.get("a").and_then(|a| a.get("b")) else {
            panic!("a.b should be a value");
        };
        assert_eq!(clock.counter, 1);
        assert!(clock.verify(value));
        assert_eq!(shelf.get("a").unwrap().clock().hash, 0);
    }

    #[test]
    fn secure_delta_sync_converges_on_conflicts() {
        let cases = [
            (json!({"a": 1}), json!({"a": 2})),
            (json!({"a": {"x": 1}, "b": 3}), json!({"a": {"x": 7, "y": 2}})),
        ];
        for (left, right) in cases {
            let mut a = Secure::from_json(&left, 1).unwrap();
            let mut b = Secure::from_json(&right, 2).unwrap();

            let delta = a.delta(&b.state_vector()).unwrap();
            b.merge(delta);
            let delta = b.delta(&a.state_vector()).unwrap();
            a.merge(delta);

            assert_eq!(a.to_json(), b.to_json(), "{left} vs {right}");
        }
    }

    #[test]
    fn encode_decode() {
        let shelf = Dot::from_json(&json!({"a": [1, 2], "b": {"c": null}}), 4).unwrap();
        let bytes = shelf.encode().unwrap();
        assert_eq!(Dot::decode(&bytes).unwrap(), shelf);
    }
}
