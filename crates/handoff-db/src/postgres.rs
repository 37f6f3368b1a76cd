use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use handoff_core::{
    Clock, HandoffToken, RandomTokenGenerator, SessionKind, TokenGenerator, UploadSession,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::store::{SessionStore, StoreError, MAX_CREATE_ATTEMPTS};

const SESSION_COLUMNS: &str = "id, token, kind, owner_ref, results, created_at, expires_at";

/// Postgres-backed session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenGenerator>,
    ttl: Duration,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            pool,
            clock,
            tokens: Arc::new(RandomTokenGenerator),
            ttl,
        }
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch(&self, token: &HandoffToken) -> Result<Option<UploadSession>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM upload_sessions WHERE token = $1",
            SESSION_COLUMNS
        ))
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }
}

fn session_from_row(row: &PgRow) -> Result<UploadSession, StoreError> {
    let token: String = row.try_get("token")?;
    let kind: String = row.try_get("kind")?;

    Ok(UploadSession {
        id: row.try_get("id")?,
        token: HandoffToken::parse(&token)
            .map_err(|_| StoreError::Corrupt("malformed token column".to_string()))?,
        kind: kind
            .parse::<SessionKind>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        owner_ref: row.try_get("owner_ref")?,
        results: row.try_get("results")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(
        &self,
        kind: SessionKind,
        owner_ref: Option<String>,
    ) -> Result<UploadSession, StoreError> {
        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let token = self.tokens.generate();
            let created_at = self.clock.now();
            let expires_at = created_at + self.ttl;

            // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
            let result = sqlx::query(&format!(
                r#"
                INSERT INTO upload_sessions (id, token, kind, owner_ref, results, created_at, expires_at)
                VALUES ($1, $2, $3, $4, '{{}}', $5, $6)
                RETURNING {}
                "#,
                SESSION_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(token.as_str())
            .bind(kind.as_str())
            .bind(owner_ref.as_deref())
            .bind(created_at)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => {
                    let session = session_from_row(&row)?;
                    tracing::info!(
                        token = %token.log_prefix(),
                        kind = %kind,
                        expires_at = %session.expires_at,
                        "Upload session created"
                    );
                    return Ok(session);
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, "Token collision on session create, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::TokenCollision(MAX_CREATE_ATTEMPTS))
    }

    async fn get(&self, token: &HandoffToken) -> Result<UploadSession, StoreError> {
        self.fetch(token).await?.ok_or(StoreError::NotFound)
    }

    async fn append_results(
        &self,
        token: &HandoffToken,
        urls: &[String],
    ) -> Result<UploadSession, StoreError> {
        let now = self.clock.now();

        if urls.is_empty() {
            let session = self.get(token).await?;
            if session.is_expired_at(now) {
                return Err(StoreError::Expired {
                    expires_at: session.expires_at,
                });
            }
            return Ok(session);
        }

        // Single-statement array concatenation keeps concurrent appends lossless.
        let row = sqlx::query(&format!(
            r#"
            UPDATE upload_sessions
            SET results = results || $2::text[]
            WHERE token = $1 AND expires_at >= $3
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(token.as_str())
        .bind(urls)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let session = session_from_row(&row)?;
                tracing::info!(
                    token = %token.log_prefix(),
                    appended = urls.len(),
                    total = session.results.len(),
                    "Session results appended"
                );
                Ok(session)
            }
            // Nothing updated: tell a missing session apart from an expired one.
            None => match self.fetch(token).await? {
                None => Err(StoreError::NotFound),
                Some(session) => {
                    tracing::warn!(
                        token = %token.log_prefix(),
                        expires_at = %session.expires_at,
                        "Append rejected on expired session"
                    );
                    Err(StoreError::Expired {
                        expires_at: session.expires_at,
                    })
                }
            },
        }
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM upload_sessions
            WHERE expires_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
