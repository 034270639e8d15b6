//! liftsync-api - reference document store for liftsync clients
//!
//! Serves the upsert-by-id and query-by-owner contract that
//! `liftsync_core::HttpRemoteStore` speaks.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use routes::{app_router, AppState};
pub use store::{DocumentStore, ExecutionPage, StoreError};
