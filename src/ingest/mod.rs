//! Snapshot import: batch loading and the per-file driver.
pub mod driver;
pub mod loader;

pub use driver::{FileReport, FileState, IngestDriver, RunReport};
pub use loader::{load_machine_types, load_records, BatchProgress, LoadSummary, DEFAULT_BATCH_SIZE};
