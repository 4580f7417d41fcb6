use std::path::PathBuf;

use thiserror::Error;

/// Reasons a snapshot document is rejected as a whole.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Bytes are not well-formed YAML.
    #[error("failed to decode snapshot: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// `about.timestamp` is absent or not an integer.
    #[error("no valid timestamp found at about.timestamp ({0})")]
    MissingTimestamp(String),

    /// A required top-level node has the wrong shape.
    #[error("invalid snapshot structure: {0}")]
    InvalidStructure(String),
}

/// A chunk transaction failed; chunks before `batch_index` stay committed.
#[derive(Error, Debug)]
#[error("failed to load batch {batch_index}: {source}")]
pub struct LoadError {
    pub batch_index: usize,
    #[source]
    pub source: rusqlite::Error,
}

/// Per-file failure caught at the driver boundary.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failures that abort the whole run.
#[derive(Error, Debug)]
pub enum FatalInitError {
    #[error("failed opening sqlite database at {path}: {source}")]
    OpenStore {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create table {table}: {source}")]
    CreateSchema {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to list snapshot directory {path}: {source}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
