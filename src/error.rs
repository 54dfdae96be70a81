//! Errors raised by the harness.
//!
//! Every failure aborts the run. Context variants record which contender,
//! probe and trial were running so the abort message points at the culprit.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The five probes of the benchmark contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Probe {
    DeltaSize,
    SizeAfterDeletion,
    CrdtSize,
    NAdditions,
    Merge,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::DeltaSize => "test_delta_size",
            Probe::SizeAfterDeletion => "test_size_after_deletion",
            Probe::CrdtSize => "test_crdt_size",
            Probe::NAdditions => "test_n_additions",
            Probe::Merge => "test_merge",
        };
        return f.write_str(name);
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("{contender} does not implement {probe}")]
    Unimplemented {
        contender: &'static str,
        probe: Probe,
    },

    #[error("{contender} produced an empty {transition} update")]
    EmptyDelta {
        contender: &'static str,
        transition: &'static str,
    },

    #[error("{contender}: {message}")]
    Engine {
        contender: &'static str,
        message: String,
    },

    #[error("{contender} failed in {probe}")]
    Probe {
        contender: &'static str,
        probe: Probe,
        #[source]
        source: Box<BenchError>,
    },

    #[error("{contender} failed in {probe} on trial {trial}")]
    Trial {
        contender: &'static str,
        probe: Probe,
        trial: usize,
        #[source]
        source: Box<BenchError>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Wrap an engine-level error for `contender`.
    pub fn engine(contender: &'static str, err: impl fmt::Display) -> BenchError {
        return BenchError::Engine {
            contender,
            message: err.to_string(),
        };
    }

    pub fn in_probe(self, contender: &'static str, probe: Probe) -> BenchError {
        return BenchError::Probe {
            contender,
            probe,
            source: Box::new(self),
        };
    }

    pub fn in_trial(self, contender: &'static str, probe: Probe, trial: usize) -> BenchError {
        return BenchError::Trial {
            contender,
            probe,
            trial,
            source: Box::new(self),
        };
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
