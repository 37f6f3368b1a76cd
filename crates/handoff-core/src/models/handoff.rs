use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::session::{SessionKind, SessionState};

/// Request to open a new handoff session
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    /// Purpose of the session: image, video or mixed
    pub kind: SessionKind,
    /// Optional external record the results will be attached to
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "owner_ref must be between 1 and 255 characters"
    ))]
    pub owner_ref: Option<String>,
}

/// A freshly issued session, ready to be shared as a link or QR code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuedSessionResponse {
    pub token: String,
    /// `{origin}/upload/{token}`
    pub handoff_url: String,
    pub kind: SessionKind,
    pub expires_at: DateTime<Utc>,
}

/// Result of a user-triggered completion check.
///
/// An empty `urls` list means "not yet", never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CompletionStatus {
    pub fulfilled: bool,
    pub urls: Vec<String>,
}

impl CompletionStatus {
    pub fn from_results(urls: Vec<String>) -> Self {
        Self {
            fulfilled: !urls.is_empty(),
            urls,
        }
    }
}

/// What the receiving device sees after resolving a token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolvedSessionResponse {
    pub kind: SessionKind,
    pub state: SessionState,
    pub expires_at: DateTime<Utc>,
    /// Number of files already attached to this session
    pub uploaded: usize,
}
