use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::loader::{load_machine_types, load_records, LoadSummary};
use crate::config::IngestConfig;
use crate::db::Db;
use crate::error::{FatalInitError, IngestError};
use crate::snapshot::{flatten, parse_snapshot, SkipStats};

/// Lifecycle of one snapshot file within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Pending,
    Parsing,
    Flattening,
    Loading,
    Done,
    Failed,
}

impl FileState {
    pub fn label(self) -> &'static str {
        match self {
            FileState::Pending => "pending",
            FileState::Parsing => "parsing",
            FileState::Flattening => "flattening",
            FileState::Loading => "loading",
            FileState::Done => "done",
            FileState::Failed => "failed",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file_name: String,
    pub state: FileState,
    /// Stage that was running when the file failed.
    pub failed_stage: Option<FileState>,
    pub error: Option<String>,
    pub records: usize,
    pub skipped: SkipStats,
    pub load: LoadSummary,
    pub machine_types_inserted: usize,
    pub elapsed: Duration,
}

impl FileReport {
    fn pending(file_name: String) -> Self {
        Self {
            file_name,
            state: FileState::Pending,
            failed_stage: None,
            error: None,
            records: 0,
            skipped: SkipStats::default(),
            load: LoadSummary::default(),
            machine_types_inserted: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == FileState::Done
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_done())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.state == FileState::Failed)
    }

    pub fn rows_inserted(&self) -> usize {
        self.files.iter().map(|f| f.load.inserted).sum()
    }
}

/// Sequential importer: every file in the data directory goes through
/// parse -> flatten -> load on its own, and a failing file never stops the run.
pub struct IngestDriver {
    config: IngestConfig,
}

impl IngestDriver {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Regular files of the data directory, in file name order.
    pub fn snapshot_files(&self) -> Result<Vec<PathBuf>, FatalInitError> {
        let dir = &self.config.data_dir;
        let list_err = |source| FatalInitError::ListDirectory {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(list_err)? {
            let path = entry.map_err(list_err)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Process every snapshot file. Only a directory listing failure is fatal.
    pub fn run(&self, db: &mut Db) -> Result<RunReport, FatalInitError> {
        let files = self.snapshot_files()?;
        info!(
            dir = %self.config.data_dir.display(),
            files = files.len(),
            batch_size = self.config.batch_size.get(),
            "starting import"
        );

        let mut report = RunReport::default();
        for path in files {
            report.files.push(self.process_file(db, &path));
        }

        info!(
            done = report.succeeded().count(),
            failed = report.failed().count(),
            rows_inserted = report.rows_inserted(),
            "import finished"
        );
        Ok(report)
    }

    #[instrument(skip(self, db, path), fields(file = %display_name(path)))]
    pub fn process_file(&self, db: &mut Db, path: &Path) -> FileReport {
        let started = Instant::now();
        let mut report = FileReport::pending(display_name(path));
        info!("processing file");

        let result = self.run_stages(db, path, &mut report);
        report.elapsed = started.elapsed();

        match result {
            Ok(()) => {
                report.state = FileState::Done;
                info!(
                    elapsed = ?report.elapsed,
                    inserted = report.load.inserted,
                    ignored = report.load.ignored,
                    "completed file"
                );
            }
            Err(err) => {
                report.failed_stage = Some(report.state);
                report.state = FileState::Failed;
                error!(
                    stage = %report.failed_stage.unwrap_or(FileState::Pending),
                    error = %err,
                    elapsed = ?report.elapsed,
                    "error processing file"
                );
                report.error = Some(err.to_string());
            }
        }
        report
    }

    fn run_stages(
        &self,
        db: &mut Db,
        path: &Path,
        report: &mut FileReport,
    ) -> Result<(), IngestError> {
        report.state = FileState::Parsing;
        let bytes = fs::read(path)?;
        let snapshot = parse_snapshot(&bytes)?;

        report.state = FileState::Flattening;
        let flattened = flatten(&snapshot);
        report.records = flattened.records.len();
        report.skipped = flattened.skipped;
        info!(
            records = report.records,
            timestamp = snapshot.timestamp,
            "found records to insert"
        );
        if !flattened.skipped.is_empty() {
            warn!(
                machine_types = flattened.skipped.machine_types(),
                regions = flattened.skipped.regions(),
                skipped = ?flattened.skipped,
                "skipped malformed snapshot entries"
            );
        }

        report.state = FileState::Loading;
        report.load = load_records(
            &mut db.conn,
            &flattened.records,
            self.config.batch_size,
            |batch| {
                info!(
                    batch = batch.index,
                    size = batch.size,
                    inserted = batch.inserted,
                    ignored = batch.ignored,
                    "inserted batch"
                )
            },
        )?;

        match load_machine_types(&mut db.conn, &flattened.machine_types) {
            Ok(n) => report.machine_types_inserted = n,
            Err(err) => warn!(error = %err, "failed to record machine type catalog"),
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
