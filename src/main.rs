use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use spot_price_history::{
    config::IngestConfig,
    db::Db,
    ingest::IngestDriver,
    logging::{init_tracing, DEFAULT_FILTER},
    util::env as env_util,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "spot-price-history",
    version,
    about = "Import spot price snapshot files into SQLite"
)]
struct Cli {
    /// SQLite database file (env: SPOT_DB_PATH)
    #[arg(long = "dbpath")]
    db_path: Option<PathBuf>,
    /// Directory of YAML snapshot files (env: SPOT_DATA_DIR)
    #[arg(long = "data")]
    data_dir: Option<PathBuf>,
    /// Records per transaction (env: SPOT_BATCH_SIZE)
    #[arg(long = "batch")]
    batch_size: Option<usize>,
}

fn main() -> ExitCode {
    env_util::init_env();
    if let Err(err) = init_tracing(DEFAULT_FILTER) {
        eprintln!("{err:#}");
    }

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "import aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = IngestConfig::resolve(cli.db_path, cli.data_dir, cli.batch_size)?;
    info!(
        db = %config.db_path.display(),
        data = %config.data_dir.display(),
        batch = config.batch_size.get(),
        "configuration resolved"
    );

    let mut db = Db::open(&config.db_path)?;
    let report = IngestDriver::new(config).run(&mut db)?;

    for failed in report.failed() {
        error!(
            file = %failed.file_name,
            stage = ?failed.failed_stage,
            error = failed.error.as_deref().unwrap_or_default(),
            "file not imported"
        );
    }
    info!(
        files = report.files.len(),
        done = report.succeeded().count(),
        failed = report.failed().count(),
        rows_inserted = report.rows_inserted(),
        "run summary"
    );
    Ok(())
}
