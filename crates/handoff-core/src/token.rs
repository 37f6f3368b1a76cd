//! Handoff token: the sole lookup key and bearer credential of an upload session.
//!
//! Format: base64url (no padding) of 32 random bytes, 43 characters.

use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TOKEN_BYTES: usize = 32;
const TOKEN_LEN: usize = 43;
/// Characters of a token that may appear in logs.
const LOG_PREFIX_LEN: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed handoff token")]
pub struct InvalidToken;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandoffToken(String);

impl HandoffToken {
    /// Generate a fresh token from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Validate an externally supplied token.
    pub fn parse(raw: &str) -> Result<Self, InvalidToken> {
        let raw = raw.trim();
        let well_formed = raw.len() == TOKEN_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidToken)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, non-authorizing prefix for log lines.
    pub fn log_prefix(&self) -> &str {
        &self.0[..LOG_PREFIX_LEN.min(self.0.len())]
    }
}

impl FromStr for HandoffToken {
    type Err = InvalidToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HandoffToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of fresh tokens, injectable so stores can be tested against collisions.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> HandoffToken;
}

/// Production generator backed by [`HandoffToken::generate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> HandoffToken {
        HandoffToken::generate()
    }
}

// Debug output never carries the full credential.
impl fmt::Debug for HandoffToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandoffToken({}…)", self.log_prefix())
    }
}
