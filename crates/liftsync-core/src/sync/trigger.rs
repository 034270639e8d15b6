//! Background scheduling of sync passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::SyncEngine;
use super::report::{SyncOutcome, SyncRound};
use crate::error::{Error, Result};

/// Starts passes on background tasks so callers never wait on the network.
#[derive(Clone)]
pub struct SyncTrigger {
    engine: Arc<SyncEngine>,
}

impl SyncTrigger {
    pub const fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Upload the owner's pending records after a local write.
    pub fn after_local_write(&self, owner_id: impl Into<String>) -> JoinHandle<Result<SyncOutcome>> {
        let engine = self.engine.clone();
        let owner_id = owner_id.into();
        tokio::spawn(async move {
            let outcome = engine.upload(&owner_id).await;
            if let Err(error) = &outcome {
                tracing::warn!(owner_id, %error, "Background upload failed");
            }
            outcome
        })
    }

    pub fn request_download(&self, owner_id: impl Into<String>) -> JoinHandle<Result<SyncOutcome>> {
        let engine = self.engine.clone();
        let owner_id = owner_id.into();
        tokio::spawn(async move {
            let outcome = engine.download(&owner_id).await;
            if let Err(error) = &outcome {
                tracing::warn!(owner_id, %error, "Background download failed");
            }
            outcome
        })
    }

    pub fn request_sync(
        &self,
        owner_id: impl Into<String>,
    ) -> JoinHandle<Result<SyncOutcome<SyncRound>>> {
        let engine = self.engine.clone();
        let owner_id = owner_id.into();
        tokio::spawn(async move {
            let outcome = engine.sync(&owner_id).await;
            if let Err(error) = &outcome {
                tracing::warn!(owner_id, %error, "Background sync failed");
            }
            outcome
        })
    }

    /// Run a full sync now and then every `every` until the handle is stopped.
    ///
    /// A zero interval is rejected.
    pub fn spawn_periodic(
        &self,
        owner_id: impl Into<String>,
        every: Duration,
    ) -> Result<PeriodicSync> {
        if every.is_zero() {
            return Err(Error::InvalidInput(
                "sync interval must be greater than zero".to_string(),
            ));
        }
        let engine = self.engine.clone();
        let owner_id = owner_id.into();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(owner_id, interval_secs = every.as_secs(), "Periodic sync started");

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(error) = engine.sync(&owner_id).await {
                            tracing::warn!(owner_id, %error, "Periodic sync failed");
                        }
                    }
                }
            }

            tracing::info!(owner_id, "Periodic sync stopped");
        });

        Ok(PeriodicSync {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

/// Handle to a periodic sync loop. Dropping it aborts the loop.
pub struct PeriodicSync {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSync {
    /// Stop after the pass in progress, if any, and wait for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "Periodic sync task ended abnormally");
            }
        }
    }
}

impl Drop for PeriodicSync {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
