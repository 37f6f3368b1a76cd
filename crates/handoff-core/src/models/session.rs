use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::token::HandoffToken;

/// Advisory purpose of a session; tailors the resolver's UI and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Image,
    Video,
    Mixed,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Image => "image",
            SessionKind::Video => "video",
            SessionKind::Mixed => "mixed",
        }
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(SessionKind::Image),
            "video" => Ok(SessionKind::Video),
            "mixed" => Ok(SessionKind::Mixed),
            _ => Err(anyhow::anyhow!("Invalid session kind: {}", s)),
        }
    }
}

impl Display for SessionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state derived from `results` and `expires_at`; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    PartiallyFulfilled,
    Expired,
}

/// A cross-device upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub id: Uuid,
    pub token: HandoffToken,
    pub kind: SessionKind,
    pub owner_ref: Option<String>,
    /// Public URLs in upload order. Append-only.
    pub results: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl UploadSession {
    /// A session is expired strictly after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_expired_at(now) {
            SessionState::Expired
        } else if self.results.is_empty() {
            SessionState::Active
        } else {
            SessionState::PartiallyFulfilled
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        !self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(created_at: DateTime<Utc>) -> UploadSession {
        UploadSession {
            id: Uuid::new_v4(),
            token: HandoffToken::generate(),
            kind: SessionKind::Video,
            owner_ref: None,
            results: Vec::new(),
            created_at,
            expires_at: created_at + Duration::hours(1),
        }
    }

    #[test]
    fn state_follows_results_and_expiry() {
        let now = Utc::now();
        let mut s = session(now);
        assert_eq!(s.state_at(now), SessionState::Active);

        s.results.push("https://cdn.example.com/videos/a.mp4".to_string());
        assert_eq!(s.state_at(now), SessionState::PartiallyFulfilled);

        assert_eq!(
            s.state_at(now + Duration::minutes(61)),
            SessionState::Expired
        );
    }

    #[test]
    fn expiry_boundary_is_inclusive_of_expires_at() {
        let now = Utc::now();
        let s = session(now);
        assert!(!s.is_expired_at(s.expires_at));
        assert!(s.is_expired_at(s.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("VIDEO".parse::<SessionKind>().unwrap(), SessionKind::Video);
        assert_eq!("mixed".parse::<SessionKind>().unwrap(), SessionKind::Mixed);
        assert!("audio".parse::<SessionKind>().is_err());
    }
}
