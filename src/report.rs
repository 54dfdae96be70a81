//! Writing finished dimension reports to disk.

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::BenchError;
use crate::error::Result;

/// A benchmark dimension; each owns one report file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    DeltaSize,
    DeletionSize,
    CrdtSize,
    Additions,
    Merges,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::DeltaSize,
        Dimension::DeletionSize,
        Dimension::CrdtSize,
        Dimension::Additions,
        Dimension::Merges,
    ];

    pub fn file_name(self) -> &'static str {
        return match self {
            Dimension::DeltaSize => "delta-size.json",
            Dimension::DeletionSize => "deletion-size.json",
            Dimension::CrdtSize => "crdt-size.json",
            Dimension::Additions => "additions.json",
            Dimension::Merges => "merges.json",
        };
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.file_name().trim_end_matches(".json");
        return f.write_str(name);
    }
}

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> ReportWriter {
        return ReportWriter { dir: dir.into() };
    }

    pub fn dir(&self) -> &Path {
        return &self.dir;
    }

    pub fn path(&self, dimension: Dimension) -> PathBuf {
        return self.dir.join(dimension.file_name());
    }

    /// Serialize `report` as pretty JSON, replacing any earlier report for
    /// the same dimension.
    pub fn write<T: Serialize>(&self, dimension: Dimension, report: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| BenchError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(dimension);
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|source| BenchError::Io {
            path: path.clone(),
            source,
        })?;
        info!(%dimension, path = %path.display(), "report written");
        return Ok(path);
    }
}
