//! Offline-first sync between the local store and a remote document store.
//!
//! Local writes only mark records dirty. [`SyncEngine::upload`] pushes dirty
//! records and clears the flag once the remote store confirms them;
//! [`SyncEngine::download`] overwrites local copies with the remote ones.

mod engine;
mod report;
mod trigger;

pub use engine::SyncEngine;
pub use report::{RecordFault, SyncEvent, SyncOutcome, SyncReport, SyncRound, SyncStatus};
pub use trigger::{PeriodicSync, SyncTrigger};
