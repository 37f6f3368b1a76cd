//! Periodic reclamation of expired sessions.
//!
//! Runs off the request path. Only session records are removed; blobs stay in
//! storage.

use chrono::Duration;
use handoff_core::{AppError, Clock};
use handoff_db::SessionStore;
use std::sync::Arc;
use tokio::time::interval;

pub struct SessionSweeper {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    grace: Duration,
    every: std::time::Duration,
}

impl SessionSweeper {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        grace: Duration,
        every: std::time::Duration,
    ) -> Self {
        Self {
            store,
            clock,
            grace,
            every,
        }
    }

    /// Start the sweeper as a background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.every);

            loop {
                sweep_interval.tick().await;

                tracing::info!(
                    grace_secs = self.grace.num_seconds(),
                    "Running expired session sweep"
                );

                match self.sweep_once().await {
                    Ok(removed) => {
                        tracing::info!(removed, "Expired session sweep completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expired session sweep failed");
                    }
                }
            }
        })
    }

    /// Delete sessions that expired more than `grace` ago.
    #[tracing::instrument(skip(self), fields(sweep.operation = "delete_expired_sessions"))]
    pub async fn sweep_once(&self) -> Result<u64, AppError> {
        let cutoff = self.clock.now() - self.grace;
        let removed = self.store.delete_expired(cutoff).await?;
        tracing::debug!(%cutoff, removed, "Deleted expired sessions");
        Ok(removed)
    }
}
