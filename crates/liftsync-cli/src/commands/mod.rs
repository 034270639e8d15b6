pub mod common;
pub mod completions;
pub mod edit;
pub mod list;
pub mod log;
pub mod stats;
pub mod status;
pub mod sync;
