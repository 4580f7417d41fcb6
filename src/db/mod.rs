use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::{info, instrument, warn};

use crate::error::FatalInitError;

pub mod pricing;

const CREATE_PRICING_HISTORY: &str = r#"
CREATE TABLE IF NOT EXISTS pricing_history (
    id INTEGER PRIMARY KEY,
    machine_type varchar(64),
    region_name varchar(64),
    hour_price REAL,
    spot_hour_price REAL,
    updated_ts INTEGER,
    updated varchar(64),
    UNIQUE(machine_type, region_name, updated_ts)
)"#;

const CREATE_MACHINE_TYPE: &str = r#"
CREATE TABLE IF NOT EXISTS machine_type (
    id INTEGER PRIMARY KEY,
    family varchar(64),
    machine_type varchar(64),
    cpu_cores INTEGER,
    memory_gb REAL
)"#;

// Expression index so rows with NULL cpu/memory still dedupe under INSERT OR IGNORE.
const CREATE_MACHINE_TYPE_KEY: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_machine_type_key
    ON machine_type(family, machine_type, IFNULL(cpu_cores, -1), IFNULL(memory_gb, -1))"#;

const CREATE_MACHINE_REGION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_machine_region ON pricing_history(machine_type, region_name)";

/// Bulk-load tuning; the importer is the only writer and can rebuild from snapshots.
const BULK_PRAGMAS: [&str; 2] = ["PRAGMA synchronous = OFF", "PRAGMA journal_mode = MEMORY"];

/// Owned SQLite connection used for one importer run.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Open (creating if needed) the database, tune it for bulk inserts and
    /// make sure the schema exists.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FatalInitError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| FatalInitError::OpenStore {
            path: path.to_path_buf(),
            source,
        })?;

        for pragma in BULK_PRAGMAS {
            if let Err(err) = conn.execute_batch(pragma) {
                warn!(pragma, error = %err, "failed to apply pragma");
            }
        }

        let db = Self { conn };
        db.init_schema()?;
        info!("sqlite database ready");
        Ok(db)
    }

    /// Open an in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self, FatalInitError> {
        let conn = Connection::open_in_memory().map_err(|source| FatalInitError::OpenStore {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an existing database for reading only. The schema is not touched.
    pub fn open_read_only(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    pub fn init_schema(&self) -> Result<(), FatalInitError> {
        for (table, sql) in [
            ("pricing_history", CREATE_PRICING_HISTORY),
            ("machine_type", CREATE_MACHINE_TYPE),
            ("machine_type", CREATE_MACHINE_TYPE_KEY),
        ] {
            self.conn
                .execute_batch(sql)
                .map_err(|source| FatalInitError::CreateSchema { table, source })?;
        }

        if let Err(err) = self.conn.execute_batch(CREATE_MACHINE_REGION_INDEX) {
            warn!(error = %err, "failed to create idx_machine_region");
        }
        Ok(())
    }

    pub fn pricing_row_count(&self) -> rusqlite::Result<i64> {
        pricing::total_records(&self.conn)
    }
}
