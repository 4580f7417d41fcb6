//! Importer configuration: CLI flags first, then environment, then defaults.
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::ingest::loader::DEFAULT_BATCH_SIZE;
use crate::util::env::{env_opt, env_parse_opt};

pub const DEFAULT_DB_PATH: &str = "db.sqlite3";
pub const DEFAULT_DATA_DIR: &str = "data/";

pub const DB_PATH_ENV: &str = "SPOT_DB_PATH";
pub const DATA_DIR_ENV: &str = "SPOT_DATA_DIR";
pub const BATCH_SIZE_ENV: &str = "SPOT_BATCH_SIZE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Directory holding snapshot files.
    pub data_dir: PathBuf,
    /// Maximum records per transaction.
    pub batch_size: NonZeroUsize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl IngestConfig {
    /// Merge explicit values with `SPOT_*` environment fallbacks.
    pub fn resolve(
        db_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        batch_size: Option<usize>,
    ) -> Result<Self> {
        let defaults = Self::default();

        let db_path = db_path
            .or_else(|| env_opt(DB_PATH_ENV).map(PathBuf::from))
            .unwrap_or(defaults.db_path);
        let data_dir = data_dir
            .or_else(|| env_opt(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or(defaults.data_dir);

        let batch_size = match batch_size {
            Some(n) => Some(n),
            None => match env_opt(BATCH_SIZE_ENV) {
                Some(raw) => Some(
                    env_parse_opt::<usize>(BATCH_SIZE_ENV)
                        .with_context(|| format!("{BATCH_SIZE_ENV}={raw} is not a number"))?,
                ),
                None => None,
            },
        };
        let batch_size = match batch_size {
            Some(n) => NonZeroUsize::new(n).ok_or_else(|| anyhow!("batch size must be positive"))?,
            None => defaults.batch_size,
        };

        Ok(Self {
            db_path,
            data_dir,
            batch_size,
        })
    }
}
