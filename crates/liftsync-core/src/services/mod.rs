//! Service layer shared by the CLI and background sync.

mod local_store;

pub use local_store::LocalStore;
