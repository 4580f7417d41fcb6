pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod snapshot;

pub mod util {
    pub mod env;
}

pub use config::IngestConfig;
pub use db::Db;
pub use ingest::{IngestDriver, RunReport};
