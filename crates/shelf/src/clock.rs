//! Clock primitives for ordering shelf writes.
//!
//! # Lamport Clock
//!
//! A single monotonic counter. Two writes with different counters are
//! ordered by counter; equal counters compare equal, so the value itself
//! decides which write survives a merge.
//!
//! # Dot Clock
//!
//! A counter tagged with the client that produced it. Equal counters from
//! different clients are concurrent and do not compare.
//!
//! # Secure Clock
//!
//! A counter plus a hash of the value it stamps. Equal counters only
//! compare equal when they stamp the same value, so two replicas that
//! wrote different values at the same time are concurrent and both sides
//! send their write when syncing.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;
use std::hash::Hasher;

use rustc_hash::FxHasher;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::value::Value;

/// A clock stamped on every node of a shelf.
pub trait Clock: Copy + Debug + PartialEq + PartialOrd + Serialize + DeserializeOwned {
    /// The clock on content a client builds from scratch.
    fn origin(client: u64) -> Self;

    /// A clock for `client` whose counter is one past `floor`.
    fn after(floor: u64, client: u64) -> Self;

    /// The logical counter.
    fn counter(&self) -> u64;

    /// The client tag, zero for untagged clocks.
    fn client(&self) -> u64;

    /// Total order used only to break ties between concurrent clocks.
    fn tiebreak(&self) -> (u64, u64) {
        return (self.counter(), self.client());
    }

    /// The clock as stamped on a leaf holding `value`.
    fn stamp(self, _value: &Value) -> Self {
        return self;
    }
}

/// A Lamport timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LamportClock {
    time: u64,
}

impl LamportClock {
    /// Create a new clock starting at 0.
    pub fn new() -> LamportClock {
        return LamportClock { time: 0 };
    }

    /// Create a clock with a specific starting time.
    pub fn with_time(time: u64) -> LamportClock {
        return LamportClock { time };
    }

}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        return self.time.cmp(&other.time);
    }
}

impl Clock for LamportClock {
    fn origin(_client: u64) -> Self {
        return LamportClock::new();
    }

    fn after(floor: u64, _client: u64) -> Self {
        return LamportClock::with_time(floor + 1);
    }

    #[inline]
    fn counter(&self) -> u64 {
        return self.time;
    }

    #[inline]
    fn client(&self) -> u64 {
        return 0;
    }
}

/// A counter tagged with the client that wrote it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DotClock {
    pub client: u64,
    pub counter: u64,
}

impl DotClock {
    pub fn new(client: u64, counter: u64) -> DotClock {
        return DotClock { client, counter };
    }
}

impl PartialOrd for DotClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return match self.counter.cmp(&other.counter) {
            Ordering::Equal if self.client == other.client => Some(Ordering::Equal),
            Ordering::Equal => None,
            order => Some(order),
        };
    }
}

impl Clock for DotClock {
    fn origin(client: u64) -> Self {
        return DotClock::new(client, 0);
    }

    fn after(floor: u64, client: u64) -> Self {
        return DotClock::new(client, floor + 1);
    }

    #[inline]
    fn counter(&self) -> u64 {
        return self.counter;
    }

    #[inline]
    fn client(&self) -> u64 {
        return self.client;
    }
}

/// A Lamport counter bound to the value it stamps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecureClock {
    pub counter: u64,
    pub hash: u64,
}

impl SecureClock {
    /// Stamp `value` at `counter`.
    pub fn new(value: &Value, counter: u64) -> SecureClock {
        let mut hasher = FxHasher::default();
        (counter, value).hash(&mut hasher);
        return SecureClock {
            counter,
            hash: hasher.finish(),
        };
    }

    /// Whether this clock was stamped on `value`.
    pub fn verify(&self, value: &Value) -> bool {
        return *self == SecureClock::new(value, self.counter);
    }
}

impl PartialOrd for SecureClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return match self.counter.cmp(&other.counter) {
            Ordering::Equal if self.hash == other.hash => Some(Ordering::Equal),
            Ordering::Equal => None,
            order => Some(order),
        };
    }
}

impl Clock for SecureClock {
    fn origin(_client: u64) -> Self {
        return SecureClock::default();
    }

    fn after(floor: u64, _client: u64) -> Self {
        return SecureClock {
            counter: floor + 1,
            hash: 0,
        };
    }

    #[inline]
    fn counter(&self) -> u64 {
        return self.counter;
    }

    #[inline]
    fn client(&self) -> u64 {
        return 0;
    }

    /// Maps keep the bare counter; leaves carry the value hash.
    fn stamp(self, value: &Value) -> Self {
        return SecureClock::new(value, self.counter);
    }

    fn tiebreak(&self) -> (u64, u64) {
        return (self.counter, self.hash);
    }
}
