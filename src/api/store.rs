use std::path::{Path, PathBuf};

use actix_web::web;
use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::Db;

/// Read-only handle on the pricing database shared by all workers.
///
/// Every query opens its own read-only connection on the blocking pool, so
/// the importer can keep writing while the API serves requests.
#[derive(Debug, Clone)]
pub struct ReadStore {
    db_path: PathBuf,
}

impl ReadStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub async fn query<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.db_path.clone();
        let value = web::block(move || {
            let conn = Db::open_read_only(&path)?;
            f(&conn)
        })
        .await??;
        Ok(value)
    }
}
