//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::migrations;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the local libSQL database file.
///
/// Connections are never shared: every caller opens its own with
/// [`Database::connect`], so each task writes through a handle it owns.
pub struct Database {
    db: LibSqlDatabase,
    path: PathBuf,
}

impl Database {
    /// Open a local database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        let db = Builder::new_local(&path_str)
            .build()
            .await
            .map_err(|error| {
                Error::Storage(format!("failed to open {}: {error}", path.display()))
            })?;

        let database = Self { db, path };
        let conn = database.connect().await?;
        // WAL lets the sync worker read while another connection writes
        conn.query("PRAGMA journal_mode = WAL;", ()).await.ok();
        migrations::run(&conn).await?;
        Ok(database)
    }

    /// Open a fresh connection for the calling context
    pub async fn connect(&self) -> Result<Connection> {
        let conn = self.db.connect().map_err(|error| {
            Error::Storage(format!("failed to connect to {}: {error}", self.path.display()))
        })?;
        Self::configure(&conn).await?;
        Ok(conn)
    }

    /// Per-connection pragmas
    async fn configure(conn: &Connection) -> Result<()> {
        conn.query(
            &format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT.as_millis()),
            (),
        )
        .await?;
        conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        conn.execute("PRAGMA synchronous = NORMAL;", ()).await.ok();
        Ok(())
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("liftsync.db");

        let db = Database::open(&path).await.unwrap();
        assert_eq!(db.path(), path.as_path());
        assert!(path.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connections_share_the_same_file() {
        let tmp = tempdir().unwrap();
        let db = Database::open(tmp.path().join("liftsync.db")).await.unwrap();

        let writer = db.connect().await.unwrap();
        writer
            .execute(
                "INSERT INTO sync_state (owner_id, last_upload_at) VALUES ('u1', 42)",
                (),
            )
            .await
            .unwrap();

        let reader = db.connect().await.unwrap();
        let mut rows = reader
            .query("SELECT last_upload_at FROM sync_state WHERE owner_id = 'u1'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 42);
    }
}
