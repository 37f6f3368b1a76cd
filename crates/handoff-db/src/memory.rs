use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use handoff_core::{
    Clock, HandoffToken, RandomTokenGenerator, SessionKind, TokenGenerator, UploadSession,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{SessionStore, StoreError, MAX_CREATE_ATTEMPTS};

/// Process-local session store.
///
/// Sessions are lost on restart. Appends hold the write lock for the whole
/// read-modify-write, which gives the same lossless merge as the Postgres store.
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<HandoffToken, UploadSession>>>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            tokens: Arc::new(RandomTokenGenerator),
            ttl,
        }
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        kind: SessionKind,
        owner_ref: Option<String>,
    ) -> Result<UploadSession, StoreError> {
        let mut sessions = self.sessions.write().await;

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let token = self.tokens.generate();
            if sessions.contains_key(&token) {
                tracing::warn!(attempt, "Token collision on session create, retrying");
                continue;
            }

            let created_at = self.clock.now();
            let session = UploadSession {
                id: Uuid::new_v4(),
                token: token.clone(),
                kind,
                owner_ref,
                results: Vec::new(),
                created_at,
                expires_at: created_at + self.ttl,
            };
            sessions.insert(token, session.clone());

            tracing::info!(
                token = %session.token.log_prefix(),
                kind = %kind,
                expires_at = %session.expires_at,
                "Upload session created"
            );
            return Ok(session);
        }

        Err(StoreError::TokenCollision(MAX_CREATE_ATTEMPTS))
    }

    async fn get(&self, token: &HandoffToken) -> Result<UploadSession, StoreError> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn append_results(
        &self,
        token: &HandoffToken,
        urls: &[String],
    ) -> Result<UploadSession, StoreError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(token).ok_or(StoreError::NotFound)?;

        if session.is_expired_at(now) {
            tracing::warn!(
                token = %token.log_prefix(),
                expires_at = %session.expires_at,
                "Append rejected on expired session"
            );
            return Err(StoreError::Expired {
                expires_at: session.expires_at,
            });
        }

        session.results.extend_from_slice(urls);
        Ok(session.clone())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
