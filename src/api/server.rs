// API server implementation using actix-web

use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

use crate::api::{middleware, routes, store::ReadStore};
use crate::config::{DB_PATH_ENV, DEFAULT_DB_PATH};
use crate::util::env::{env_opt, env_parse_opt};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub allowed_origins: String,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        crate::util::env::init_env();

        let host = env_opt("API_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env_opt("API_PORT") {
            Some(raw) => env_parse_opt::<u16>("API_PORT")
                .with_context(|| format!("Invalid API_PORT: {raw}"))?,
            None => DEFAULT_PORT,
        };
        let db_path = env_opt(DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let allowed_origins =
            env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());

        Ok(Self {
            host,
            port,
            db_path,
            allowed_origins,
        })
    }

    /// Start the HTTP server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        if !self.db_path.exists() {
            tracing::warn!(
                path = %self.db_path.display(),
                "database file not found; queries will fail until the importer has run"
            );
        }
        tracing::info!(
            host = %self.host,
            port = self.port,
            db = %self.db_path.display(),
            "Starting spot price API server"
        );

        let store = web::Data::new(ReadStore::new(self.db_path.clone()));
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(store.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
