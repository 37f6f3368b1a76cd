//! Issuing side of the handoff: create a session, share it, poll it.

use handoff_core::constants::HANDOFF_PATH_PREFIX;
use handoff_core::models::{CompletionStatus, IssuedSessionResponse};
use handoff_core::{AppError, HandoffToken, SessionKind, UploadSession};
use handoff_db::{SessionStore, StoreError};
use qrcode::render::svg;
use qrcode::QrCode;
use std::sync::Arc;

/// Smallest rendered QR code edge, in pixels.
const QR_MIN_DIMENSION: u32 = 200;

/// A session together with the link that hands it to another device.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: UploadSession,
    pub handoff_url: String,
}

impl From<IssuedSession> for IssuedSessionResponse {
    fn from(issued: IssuedSession) -> Self {
        IssuedSessionResponse {
            token: issued.session.token.to_string(),
            handoff_url: issued.handoff_url,
            kind: issued.session.kind,
            expires_at: issued.session.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn SessionStore>,
    public_origin: String,
}

impl SessionIssuer {
    pub fn new(store: Arc<dyn SessionStore>, public_origin: impl Into<String>) -> Self {
        Self {
            store,
            public_origin: public_origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{origin}/upload/{token}`
    pub fn handoff_url(&self, token: &HandoffToken) -> String {
        format!("{}{}/{}", self.public_origin, HANDOFF_PATH_PREFIX, token)
    }

    pub async fn issue(
        &self,
        kind: SessionKind,
        owner_ref: Option<String>,
    ) -> Result<IssuedSession, AppError> {
        let session = self.store.create(kind, owner_ref).await?;
        let handoff_url = self.handoff_url(&session.token);

        Ok(IssuedSession {
            session,
            handoff_url,
        })
    }

    /// One user-triggered read of the session's results.
    ///
    /// An empty result list is reported as not yet fulfilled, never as an error.
    pub async fn check_completion(&self, token: &str) -> Result<CompletionStatus, AppError> {
        let token = parse_token(token)?;
        let session = self.store.get(&token).await.map_err(|e| {
            if !matches!(e, StoreError::NotFound) {
                tracing::warn!(token = %token.log_prefix(), error = %e, "Completion check failed");
            }
            AppError::from(e)
        })?;

        tracing::debug!(
            token = %token.log_prefix(),
            results = session.results.len(),
            "Completion checked"
        );
        Ok(CompletionStatus::from_results(session.results))
    }

    /// Scannable code for an existing session's handoff link.
    pub async fn qr_svg_for(&self, token: &str) -> Result<String, AppError> {
        let token = parse_token(token)?;
        let session = self.store.get(&token).await?;
        Self::render_qr_svg(&self.handoff_url(&session.token))
    }

    pub fn render_qr_svg(url: &str) -> Result<String, AppError> {
        let code = QrCode::new(url.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to encode QR code: {}", e)))?;

        Ok(code
            .render::<svg::Color<'_>>()
            .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
            .quiet_zone(true)
            .build())
    }
}

/// Malformed tokens are indistinguishable from unknown ones.
pub(crate) fn parse_token(raw: &str) -> Result<HandoffToken, AppError> {
    HandoffToken::parse(raw).map_err(|_| AppError::NotFound("Upload link not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use handoff_core::{ErrorMetadata, ManualClock};
    use handoff_db::InMemorySessionStore;

    fn issuer() -> (SessionIssuer, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new(
            Arc::new(ManualClock::default()),
            Duration::hours(1),
        ));
        (
            SessionIssuer::new(store.clone(), "https://movers.example.com/"),
            store,
        )
    }

    #[tokio::test]
    async fn issue_builds_handoff_url() {
        let (issuer, _store) = issuer();
        let issued = issuer.issue(SessionKind::Video, None).await.unwrap();

        assert_eq!(
            issued.handoff_url,
            format!("https://movers.example.com/upload/{}", issued.session.token)
        );
        let response = IssuedSessionResponse::from(issued.clone());
        assert_eq!(response.token, issued.session.token.as_str());
        assert_eq!(response.kind, SessionKind::Video);
    }

    #[tokio::test]
    async fn empty_results_are_not_yet_fulfilled() {
        let (issuer, _store) = issuer();
        let issued = issuer.issue(SessionKind::Image, None).await.unwrap();

        let status = issuer
            .check_completion(issued.session.token.as_str())
            .await
            .unwrap();
        assert!(!status.fulfilled);
        assert!(status.urls.is_empty());
    }

    #[tokio::test]
    async fn completion_reports_urls_once_appended() {
        let (issuer, store) = issuer();
        let issued = issuer.issue(SessionKind::Image, None).await.unwrap();
        store
            .append_results(&issued.session.token, &["https://cdn/a.jpg".to_string()])
            .await
            .unwrap();

        let status = issuer
            .check_completion(issued.session.token.as_str())
            .await
            .unwrap();
        assert!(status.fulfilled);
        assert_eq!(status.urls, vec!["https://cdn/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn unknown_or_malformed_tokens_are_not_found() {
        let (issuer, _store) = issuer();
        let err = issuer.check_completion("nope").await.unwrap_err();
        assert_eq!(err.http_status_code(), 404);

        let err = issuer
            .check_completion(HandoffToken::generate().as_str())
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 404);
    }

    #[tokio::test]
    async fn qr_code_is_svg() {
        let (issuer, _store) = issuer();
        let issued = issuer.issue(SessionKind::Mixed, None).await.unwrap();

        let svg = issuer
            .qr_svg_for(issued.session.token.as_str())
            .await
            .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }
}
