use async_trait::async_trait;
use chrono::{DateTime, Utc};
use handoff_core::{AppError, HandoffToken, SessionKind, UploadSession};
use thiserror::Error;

/// Attempts at allocating an unused token before giving up.
pub const MAX_CREATE_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload session not found")]
    NotFound,

    #[error("upload session expired at {expires_at}")]
    Expired { expires_at: DateTime<Utc> },

    #[error("no unused token after {0} attempts")]
    TokenCollision(u32),

    #[error("corrupt session record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Upload link not found".to_string()),
            StoreError::Expired { .. } => {
                AppError::SessionExpired("This upload link has expired".to_string())
            }
            StoreError::Database(e) => AppError::Database(e),
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Durable keyed record of handoff sessions.
///
/// Reads always succeed for existing sessions, expired or not. Writes are refused
/// once `now > expires_at` according to the store's own clock, so clients cannot
/// extend a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session with empty results under a fresh, unused token.
    async fn create(
        &self,
        kind: SessionKind,
        owner_ref: Option<String>,
    ) -> Result<UploadSession, StoreError>;

    async fn get(&self, token: &HandoffToken) -> Result<UploadSession, StoreError>;

    /// Atomically extend `results` with `urls`, after any existing entries.
    ///
    /// Concurrent callers never lose each other's URLs.
    async fn append_results(
        &self,
        token: &HandoffToken,
        urls: &[String],
    ) -> Result<UploadSession, StoreError>;

    /// Delete sessions that expired before `cutoff`. Returns the number removed.
    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Readiness check.
    async fn ping(&self) -> Result<(), StoreError>;
}
