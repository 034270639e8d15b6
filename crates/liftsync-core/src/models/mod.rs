//! Data models for liftsync

mod execution;
mod remote_execution;
mod sync_state;

pub use execution::{ExecutionEdit, ExecutionId, ExecutionRecord, NewExecution};
pub use remote_execution::RemoteExecution;
pub use sync_state::{SyncKind, SyncState};
