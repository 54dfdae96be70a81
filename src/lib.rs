//! Shelf Bench - differential benchmarks for JSON-like CRDT engines.
//!
//! Every engine is wrapped as a contender implementing
//! [`BenchmarkEnvironment`]. Contenders are fed identical pseudorandom
//! content trees and compared on encoded delta sizes, deletion overhead,
//! snapshot size and wall-clock throughput.
//!
//! # Quick Start
//!
//! ```
//! use shelf_bench::contender::BenchmarkEnvironment;
//! use shelf_bench::contender::ContenderKind;
//! use shelf_bench::fuzzer::Fuzzer;
//! use shelf_bench::fuzzer::FuzzerConfig;
//!
//! // Generate two trees
//! let mut fuzzer = Fuzzer::new(FuzzerConfig::default());
//! let (first, second) = fuzzer.generate_pair();
//!
//! // Measure what it takes to sync them
//! let env = ContenderKind::Shelf.environment();
//! let sizes = env.test_delta_size(first, second).unwrap();
//! assert!(sizes.contains_key("field_change"));
//! ```

pub mod config;
pub mod contender;
pub mod error;
pub mod fuzzer;
pub mod metrics;
pub mod micro;
pub mod report;
pub mod suite;
pub mod trials;

pub use contender::BenchmarkEnvironment;
pub use error::BenchError;
pub use error::Result;
