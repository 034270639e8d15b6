//! liftsync-core - Core library for liftsync
//!
//! Local execution history, the remote store contract and the sync engine
//! that moves dirty records between them. Shared by the CLI and the API.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod stats;
pub mod sync;
pub mod util;

pub use config::{ConfigError, SyncSettings};
pub use error::{Error, Result};
pub use models::{
    ExecutionEdit, ExecutionId, ExecutionRecord, NewExecution, RemoteExecution, SyncKind,
    SyncState,
};
pub use remote::{
    HttpRemoteStore, HttpRemoteStoreConfig, InMemoryRemoteStore, RemoteError, RemoteStore,
};
pub use services::LocalStore;
pub use stats::ProgressSummary;
pub use sync::{SyncEngine, SyncEvent, SyncOutcome, SyncReport, SyncTrigger};
