//! Publishes a batch's successful URLs into the session.

use handoff_core::{AppError, HandoffToken, UploadSession};
use handoff_db::{SessionStore, StoreError};
use handoff_processing::BatchReport;
use std::sync::Arc;

#[derive(Clone)]
pub struct ResultPublisher {
    store: Arc<dyn SessionStore>,
}

impl ResultPublisher {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Append the batch's URLs after any earlier results for the session.
    ///
    /// A batch without a single successful upload makes no store write and
    /// returns `Ok(None)`. Writes to an expired or vanished session surface as
    /// [`AppError::StoreWriteRejected`].
    #[tracing::instrument(
        skip(self, token, report),
        fields(token = %token.log_prefix(), uploaded = report.uploaded.len())
    )]
    pub async fn publish(
        &self,
        token: &HandoffToken,
        report: &BatchReport,
    ) -> Result<Option<UploadSession>, AppError> {
        if !report.has_uploads() {
            tracing::debug!(failed = report.failures.len(), "Nothing to publish");
            return Ok(None);
        }

        match self.store.append_results(token, &report.urls()).await {
            Ok(session) => {
                tracing::info!(results = session.results.len(), "Results published");
                Ok(Some(session))
            }
            Err(StoreError::Expired { expires_at }) => {
                tracing::warn!(%expires_at, "Publish rejected, session expired");
                Err(AppError::StoreWriteRejected(
                    "Upload link expired before the files could be attached".to_string(),
                ))
            }
            Err(StoreError::NotFound) => {
                tracing::warn!("Publish rejected, session not found");
                Err(AppError::StoreWriteRejected(
                    "Upload link no longer exists".to_string(),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
