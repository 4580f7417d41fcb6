use std::num::NonZeroUsize;

use chrono::SecondsFormat;
use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::instrument;

use crate::error::LoadError;
use crate::snapshot::{MachineTypeEntry, PriceRecord};

pub const DEFAULT_BATCH_SIZE: usize = 2000;

const INSERT_PRICE: &str = "INSERT OR IGNORE INTO pricing_history \
    (machine_type, region_name, hour_price, spot_hour_price, updated_ts, updated) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const INSERT_MACHINE_TYPE: &str = "INSERT OR IGNORE INTO machine_type \
    (family, machine_type, cpu_cores, memory_gb) VALUES (?1, ?2, ?3, ?4)";

/// Emitted after each committed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Zero-based chunk index within this load.
    pub index: usize,
    /// Records in the chunk.
    pub size: usize,
    /// Rows actually written.
    pub inserted: usize,
    /// Records already present (uniqueness key hit).
    pub ignored: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Committed transactions.
    pub batches: usize,
    pub attempted: usize,
    pub inserted: usize,
    pub ignored: usize,
}

/// Display form stored in the `updated` column.
pub fn format_updated(record: &PriceRecord) -> String {
    record.updated.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Insert one chunk in its own transaction. Returns rows written.
///
/// Dropping the transaction without commit rolls it back, so an error on any
/// row leaves the chunk unapplied.
fn commit_chunk(conn: &mut Connection, chunk: &[PriceRecord]) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(INSERT_PRICE)?;
        for record in chunk {
            inserted += stmt.execute(params![
                record.machine_type,
                record.region_name,
                record.hour_price,
                record.spot_hour_price,
                record.updated_ts,
                format_updated(record),
            ])?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Persist `records` in chunks of at most `batch_size`, one transaction per
/// chunk, with insert-or-ignore on (machine_type, region_name, updated_ts).
///
/// On failure the failing chunk is rolled back and the load stops; earlier
/// chunks stay committed. Re-running a load is safe.
#[instrument(skip(conn, records, on_batch), fields(record_count = records.len()))]
pub fn load_records<F>(
    conn: &mut Connection,
    records: &[PriceRecord],
    batch_size: NonZeroUsize,
    mut on_batch: F,
) -> Result<LoadSummary, LoadError>
where
    F: FnMut(BatchProgress),
{
    let mut summary = LoadSummary::default();

    for (index, chunk) in records.chunks(batch_size.get()).enumerate() {
        let inserted = commit_chunk(conn, chunk).map_err(|source| LoadError {
            batch_index: index,
            source,
        })?;

        let progress = BatchProgress {
            index,
            size: chunk.len(),
            inserted,
            ignored: chunk.len() - inserted,
        };
        summary.batches += 1;
        summary.attempted += progress.size;
        summary.inserted += progress.inserted;
        summary.ignored += progress.ignored;
        on_batch(progress);
    }

    Ok(summary)
}

/// Record machine type catalog entries. Returns rows written.
pub fn load_machine_types(
    conn: &mut Connection,
    entries: &[MachineTypeEntry],
) -> rusqlite::Result<usize> {
    if entries.is_empty() {
        return Ok(0);
    }
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(INSERT_MACHINE_TYPE)?;
        for entry in entries {
            inserted += stmt.execute(params![
                entry.family,
                entry.machine_type,
                entry.cpu_cores,
                entry.memory_gb,
            ])?;
        }
    }
    tx.commit()?;
    Ok(inserted)
}
