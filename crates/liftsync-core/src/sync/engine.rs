//! Upload and download passes between the local and remote stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use super::report::{RecordFault, SyncEvent, SyncOutcome, SyncReport, SyncRound, SyncStatus};
use crate::error::{Error, Result};
use crate::models::{RemoteExecution, SyncKind};
use crate::remote::RemoteStore;
use crate::services::LocalStore;
use crate::util::now_millis;

const EVENT_CAPACITY: usize = 256;

/// Moves executions between the local store and a remote store.
///
/// At most one pass runs at a time per engine; a pass requested while another
/// is in flight returns [`SyncOutcome::Skipped`]. Construct one engine per
/// local store and share it behind an `Arc`.
pub struct SyncEngine {
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    in_flight: AtomicBool,
    status: watch::Sender<SyncStatus>,
    events: broadcast::Sender<SyncEvent>,
}

/// Clears the in-flight flag when the pass ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    status: &'a watch::Sender<SyncStatus>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        self.status.send_modify(|status| status.syncing = false);
    }
}

impl SyncEngine {
    pub fn new(local: LocalStore, remote: Arc<dyn RemoteStore>) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            local,
            remote,
            in_flight: AtomicBool::new(false),
            status,
            events,
        }
    }

    pub const fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Push the owner's dirty records to the remote store.
    pub async fn upload(&self, owner_id: &str) -> Result<SyncOutcome> {
        let owner_id = validate_owner(owner_id)?;
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(owner_id, "Upload skipped; a pass is already running");
            return Ok(SyncOutcome::Skipped);
        };

        let result = self.upload_pass(owner_id).await;
        self.conclude(SyncKind::Upload, owner_id, result)
            .map(SyncOutcome::Completed)
    }

    /// Replace local copies with the owner's remote documents.
    pub async fn download(&self, owner_id: &str) -> Result<SyncOutcome> {
        let owner_id = validate_owner(owner_id)?;
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(owner_id, "Download skipped; a pass is already running");
            return Ok(SyncOutcome::Skipped);
        };

        let result = self.download_pass(owner_id).await;
        self.conclude(SyncKind::Download, owner_id, result)
            .map(SyncOutcome::Completed)
    }

    /// Upload then download under a single in-flight guard.
    pub async fn sync(&self, owner_id: &str) -> Result<SyncOutcome<SyncRound>> {
        let owner_id = validate_owner(owner_id)?;
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(owner_id, "Sync skipped; a pass is already running");
            return Ok(SyncOutcome::Skipped);
        };

        let upload_result = self.upload_pass(owner_id).await;
        let upload = self.conclude(SyncKind::Upload, owner_id, upload_result)?;
        let download_result = self.download_pass(owner_id).await;
        let download = self.conclude(SyncKind::Download, owner_id, download_result)?;

        Ok(SyncOutcome::Completed(SyncRound { upload, download }))
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.status.send_modify(|status| status.syncing = true);
        Some(InFlightGuard {
            flag: &self.in_flight,
            status: &self.status,
        })
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        self.events.send(event).ok();
    }

    async fn upload_pass(&self, owner_id: &str) -> Result<SyncReport> {
        let mut report = SyncReport::begin(SyncKind::Upload, owner_id);
        self.emit(SyncEvent::PassStarted {
            kind: SyncKind::Upload,
            owner_id: owner_id.to_string(),
        });

        let dirty = self.local.query_dirty(owner_id).await?;
        report.attempted = dirty.len();
        let mut pending_events = Vec::new();

        for record in dirty {
            let document = RemoteExecution::from(&record);
            if let Err(error) = self.remote.put(&document).await {
                if error.is_retryable() {
                    tracing::warn!(owner_id, id = %record.id, %error, "Upload deferred");
                } else {
                    tracing::warn!(owner_id, id = %record.id, %error, rejected = true, "Upload rejected");
                }
                let fault = RecordFault {
                    id: record.id,
                    error,
                };
                pending_events.push(SyncEvent::RecordFault {
                    owner_id: owner_id.to_string(),
                    fault: fault.clone(),
                });
                report.faults.push(fault);
                continue;
            }

            report.succeeded += 1;
            match self
                .local
                .mark_clean_if_unchanged(&record.id, record.updated_at)
                .await
            {
                Ok(true) => tracing::debug!(owner_id, id = %record.id, "Execution uploaded"),
                Ok(false) => {
                    tracing::debug!(owner_id, id = %record.id, "Execution edited during upload; left dirty");
                }
                Err(error) => {
                    // put is idempotent, so the next pass resends it
                    tracing::warn!(owner_id, id = %record.id, %error, "Failed to mark execution clean");
                    report.clean_failures += 1;
                    pending_events.push(SyncEvent::CleanFailed {
                        owner_id: owner_id.to_string(),
                        id: record.id,
                        message: error.to_string(),
                    });
                }
            }
        }

        if report.succeeded > 0 {
            self.remember_pass(owner_id, SyncKind::Upload).await;
        }
        for event in pending_events {
            self.emit(event);
        }
        Ok(report.finish())
    }

    async fn download_pass(&self, owner_id: &str) -> Result<SyncReport> {
        let mut report = SyncReport::begin(SyncKind::Download, owner_id);
        self.emit(SyncEvent::PassStarted {
            kind: SyncKind::Download,
            owner_id: owner_id.to_string(),
        });

        let documents = self.remote.query_by_owner(owner_id).await?;
        report.attempted = documents.len();

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            if document.owner_id != owner_id {
                tracing::warn!(
                    owner_id,
                    id = %document.id,
                    foreign_owner = %document.owner_id,
                    "Skipping document owned by someone else"
                );
                report.skipped += 1;
                continue;
            }

            let id = document.id.clone();
            match document.into_local() {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(owner_id, id = %id, %error, "Skipping malformed document");
                    report.skipped += 1;
                }
            }
        }

        // Remote wins, including over local edits not yet uploaded
        report.succeeded = self.local.upsert_many(&records).await?;
        self.remember_pass(owner_id, SyncKind::Download).await;
        Ok(report.finish())
    }

    async fn remember_pass(&self, owner_id: &str, kind: SyncKind) {
        if let Err(error) = self.local.record_sync(owner_id, kind, now_millis()).await {
            tracing::warn!(owner_id, %kind, %error, "Failed to record sync time");
        }
    }

    fn conclude(
        &self,
        kind: SyncKind,
        owner_id: &str,
        result: Result<SyncReport>,
    ) -> Result<SyncReport> {
        match &result {
            Ok(report) => {
                tracing::info!(
                    owner_id,
                    %kind,
                    attempted = report.attempted,
                    succeeded = report.succeeded,
                    skipped = report.skipped,
                    network_faults = report.network_faults(),
                    rejected = report.rejected(),
                    clean_failures = report.clean_failures,
                    "Sync pass finished"
                );
                self.status.send_modify(|status| {
                    match kind {
                        SyncKind::Upload => status.last_upload_at = Some(report.finished_at),
                        SyncKind::Download => status.last_download_at = Some(report.finished_at),
                    }
                    status.last_error = None;
                });
                self.emit(SyncEvent::PassFinished(report.clone()));
            }
            Err(error) => {
                if error.is_storage_fault() {
                    tracing::error!(owner_id, %kind, %error, "Sync pass failed on local storage");
                } else {
                    tracing::warn!(owner_id, %kind, %error, "Sync pass failed");
                }
                let message = error.to_string();
                self.status
                    .send_modify(|status| status.last_error = Some(message.clone()));
                self.emit(SyncEvent::PassFailed {
                    kind,
                    owner_id: owner_id.to_string(),
                    message,
                });
            }
        }
        result
    }
}

fn validate_owner(owner_id: &str) -> Result<&str> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(Error::InvalidInput("owner_id must not be empty".into()));
    }
    Ok(owner_id)
}
