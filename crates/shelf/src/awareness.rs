//! Presence state kept in a shelf.
//!
//! Every client owns one subtree of a shared root map, keyed by its client
//! id. Only the owner writes into its subtree, so peers never race on the
//! same node and plain Lamport clocks are enough. Updates are ordinary
//! shelf deltas: changing one field of the local state sends one path, not
//! the whole state.

use serde_json::Value as Json;

use crate::clock::LamportClock;
use crate::error::Result;
use crate::shelf::Shelf;
use crate::state_vector::StateVector;

#[derive(Clone, Debug)]
pub struct Awareness {
    client: u64,
    clients: Shelf<LamportClock>,
}

impl Awareness {
    /// A replica with no local state yet.
    pub fn new(client: u64) -> Awareness {
        return Awareness {
            client,
            clients: Shelf::default(),
        };
    }

    /// A replica whose local state is `json`.
    pub fn with_state(client: u64, json: &Json) -> Result<Awareness> {
        let mut awareness = Awareness::new(client);
        awareness.set_local_state(json)?;
        return Ok(awareness);
    }

    #[inline]
    fn key(&self) -> String {
        return self.client.to_string();
    }

    /// Replace the whole local state.
    pub fn set_local_state(&mut self, json: &Json) -> Result<()> {
        return self.clients.set(&[self.key()], json, self.client);
    }

    /// Write `json` at `path` inside the local state. The empty path
    /// replaces the whole state.
    pub fn set<P: AsRef<str>>(&mut self, path: &[P], json: &Json) -> Result<()> {
        let mut full = vec![self.key()];
        full.extend(path.iter().map(|key| key.as_ref().to_string()));
        return self.clients.set(&full, json, self.client);
    }

    /// Empty the local state. Peers see an empty map for this client.
    pub fn clear_local_state(&mut self) -> Result<()> {
        return self.set_local_state(&Json::Object(Default::default()));
    }

    pub fn local_state(&self) -> Option<Json> {
        return self.state_of(self.client);
    }

    pub fn state_of(&self, client: u64) -> Option<Json> {
        return self.clients.get(&client.to_string()).map(Shelf::to_json);
    }

    /// Every known client and its state.
    pub fn to_json(&self) -> Json {
        return self.clients.to_json();
    }

    pub fn state_vector(&self) -> StateVector<LamportClock> {
        return self.clients.state_vector();
    }

    /// What a peer with state vector `sv` is missing.
    pub fn delta(&self, sv: &StateVector<LamportClock>) -> Option<Shelf<LamportClock>> {
        return self.clients.delta(sv);
    }

    pub fn merge(&mut self, delta: Shelf<LamportClock>) {
        self.clients.merge(delta);
        self.clients.garbage_collect();
    }

    /// The full replica as it would be sent to a peer that knows nothing.
    pub fn encode(&self) -> Result<Vec<u8>> {
        return self.clients.encode();
    }
}
