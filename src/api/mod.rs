// Read-only HTTP API over the spot price history database

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod store;

pub use error::ApiError;
pub use server::ApiServer;
pub use store::ReadStore;
