//! Per-owner sync bookkeeping

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Local dirty records pushed to the remote store
    Upload,
    /// Remote records pulled into the local store
    Download,
}

impl SyncKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last successful pass times for one owner (Unix ms)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub owner_id: String,
    pub last_upload_at: Option<i64>,
    pub last_download_at: Option<i64>,
}
