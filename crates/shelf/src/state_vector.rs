//! State vectors and deltas for shelves.
//!
//! A state vector mirrors the shape of a shelf but keeps only clocks. A
//! peer sends its state vector; the other side answers with the smallest
//! sub-shelf that carries everything the peer is missing.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::shelf::Shelf;

/// Clock-only summary of a shelf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StateVector<C> {
    Node(BTreeMap<String, StateVector<C>>, C),
    Leaf(C),
}

impl<C: Clock> StateVector<C> {
    #[inline]
    pub fn clock(&self) -> C {
        return match self {
            StateVector::Node(_, clock) | StateVector::Leaf(clock) => *clock,
        };
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        return Ok(bincode::serialize(self)?);
    }

    pub fn decode(bytes: &[u8]) -> Result<StateVector<C>> {
        return Ok(bincode::deserialize(bytes)?);
    }
}

impl<C: Clock> Shelf<C> {
    pub fn state_vector(&self) -> StateVector<C> {
        return match self {
            Shelf::Value { clock, .. } => StateVector::Leaf(*clock),
            Shelf::Map { shelves, clock } => StateVector::Node(
                shelves
                    .iter()
                    .map(|(key, shelf)| (key.clone(), shelf.state_vector()))
                    .collect(),
                *clock,
            ),
        };
    }

    /// Everything a peer with state vector `sv` is missing, or `None` when
    /// the peer is up to date as far as clocks can tell.
    ///
    /// Two values with equal clocks are assumed identical; only clocks
    /// travel in a state vector.
    pub fn delta(&self, sv: &StateVector<C>) -> Option<Shelf<C>> {
        let by_clock = self.clock().partial_cmp(&sv.clock());
        return match (self, sv, by_clock) {
            (_, _, Some(Ordering::Less)) => None,
            (_, _, Some(Ordering::Greater)) => Some(self.clone()),
            (Shelf::Map { shelves, clock }, StateVector::Node(known, known_clock), _) => {
                let missing: BTreeMap<String, Shelf<C>> = shelves
                    .iter()
                    .filter_map(|(key, shelf)| {
                        let delta = match known.get(key) {
                            Some(child) => shelf.delta(child),
                            // Older than the peer's map: already overwritten there.
                            None if shelf.clock() < *known_clock => None,
                            None => Some(shelf.clone()),
                        };
                        return delta.map(|delta| (key.clone(), delta));
                    })
                    .collect();
                (!missing.is_empty()).then(|| Shelf::Map {
                    shelves: missing,
                    clock: *clock,
                })
            }
            // Maps outrank values on equal or concurrent clocks.
            (Shelf::Map { .. }, StateVector::Leaf(_), _) => Some(self.clone()),
            (Shelf::Value { .. }, StateVector::Node(..), _) => None,
            (Shelf::Value { .. }, StateVector::Leaf(_), Some(Ordering::Equal)) => None,
            (Shelf::Value { .. }, StateVector::Leaf(_), None) => Some(self.clone()),
        };
    }
}
