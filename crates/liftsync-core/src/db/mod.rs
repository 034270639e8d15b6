//! Database layer for liftsync

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{ExecutionRepository, LibSqlExecutionRepository};
