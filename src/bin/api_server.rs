// Read-only HTTP API over the spot price history database

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use spot_price_history::api::ApiServer;
use spot_price_history::logging::{init_tracing, DEFAULT_FILTER};
use spot_price_history::util::env as env_util;

#[derive(Parser, Debug)]
#[command(name = "api_server", version, about = "Serve spot price history as JSON")]
struct Cli {
    /// SQLite database file (env: SPOT_DB_PATH)
    #[arg(long = "dbpath")]
    db_path: Option<PathBuf>,
    /// Bind address (env: API_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Bind port (env: API_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing(DEFAULT_FILTER)?;

    let cli = Cli::parse();
    let mut server = ApiServer::from_env()?;
    if let Some(db_path) = cli.db_path {
        server.db_path = db_path;
    }
    if let Some(host) = cli.host {
        server.host = host;
    }
    if let Some(port) = cli.port {
        server.port = port;
    }

    server.run().await
}
