//! Shelf - JSON-shaped CRDTs with per-node clocks.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use shelf::DotClock;
//! use shelf::Shelf;
//!
//! let left = Shelf::<DotClock>::from_json(&json!({"a": 1}), 1).unwrap();
//! let mut right = Shelf::<DotClock>::from_json(&json!({"b": 2}), 2).unwrap();
//!
//! // Send only what `right` is missing.
//! let delta = left.delta(&right.state_vector()).unwrap();
//! right.merge(delta);
//! assert_eq!(right.to_json(), json!({"a": 1, "b": 2}));
//! ```

pub mod awareness;
pub mod clock;
mod error;
mod shelf;
pub mod state_vector;
pub mod value;

pub use awareness::Awareness;
pub use clock::Clock;
pub use clock::DotClock;
pub use clock::LamportClock;
pub use clock::SecureClock;
pub use error::Result;
pub use error::ShelfError;
pub use shelf::Shelf;
pub use state_vector::StateVector;
pub use value::Value;
