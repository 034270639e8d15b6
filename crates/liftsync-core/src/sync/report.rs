//! Pass results and events published by the sync engine.

use serde::Serialize;

use crate::models::{ExecutionId, SyncKind};
use crate::remote::RemoteError;
use crate::util::now_millis;

/// Result of asking the engine to run a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome<T = SyncReport> {
    /// The pass ran to completion
    Completed(T),
    /// Another pass was already in flight; nothing was done
    Skipped,
}

impl<T> SyncOutcome<T> {
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Skipped => None,
        }
    }
}

/// Upload followed by download, as run by [`super::SyncEngine::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRound {
    pub upload: SyncReport,
    pub download: SyncReport,
}

/// One record the remote store refused or could not be reached for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFault {
    pub id: ExecutionId,
    pub error: RemoteError,
}

/// Counters for a finished pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub kind: SyncKind,
    pub owner_id: String,
    /// Records (upload) or documents (download) considered
    pub attempted: usize,
    /// Records confirmed by the remote store, or applied locally
    pub succeeded: usize,
    /// Downloaded documents that could not be applied
    pub skipped: usize,
    #[serde(skip)]
    pub faults: Vec<RecordFault>,
    /// Uploaded records whose dirty flag could not be cleared
    pub clean_failures: usize,
    pub started_at: i64,
    pub finished_at: i64,
}

impl SyncReport {
    pub(crate) fn begin(kind: SyncKind, owner_id: &str) -> Self {
        let now = now_millis();
        Self {
            kind,
            owner_id: owner_id.to_string(),
            attempted: 0,
            succeeded: 0,
            skipped: 0,
            faults: Vec::new(),
            clean_failures: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = now_millis();
        self
    }

    /// Faults worth retrying later
    pub fn network_faults(&self) -> usize {
        self.faults
            .iter()
            .filter(|fault| fault.error.is_retryable())
            .count()
    }

    pub fn rejected(&self) -> usize {
        self.faults.len() - self.network_faults()
    }

    /// Every considered item went through without a fault.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty() && self.clean_failures == 0 && self.skipped == 0
    }
}

/// Snapshot of the engine as seen by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub syncing: bool,
    pub last_upload_at: Option<i64>,
    pub last_download_at: Option<i64>,
    pub last_error: Option<String>,
}

/// Progress notifications broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    PassStarted {
        kind: SyncKind,
        owner_id: String,
    },
    RecordFault {
        owner_id: String,
        fault: RecordFault,
    },
    CleanFailed {
        owner_id: String,
        id: ExecutionId,
        message: String,
    },
    PassFinished(SyncReport),
    PassFailed {
        kind: SyncKind,
        owner_id: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_split_faults_by_kind() {
        let mut report = SyncReport::begin(SyncKind::Upload, "u1");
        assert!(report.is_clean());

        report.faults.push(RecordFault {
            id: ExecutionId::new(),
            error: RemoteError::Network("offline".into()),
        });
        report.faults.push(RecordFault {
            id: ExecutionId::new(),
            error: RemoteError::Rejected("bad payload".into()),
        });
        report.faults.push(RecordFault {
            id: ExecutionId::new(),
            error: RemoteError::Network("timeout".into()),
        });

        assert_eq!(report.network_faults(), 2);
        assert_eq!(report.rejected(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn skipped_outcome_has_no_value() {
        let outcome: SyncOutcome = SyncOutcome::Skipped;
        assert!(outcome.is_skipped());
        assert_eq!(outcome.completed(), None);
    }
}
