//! Receiving side of the handoff: resolve a link and upload into it.

use handoff_core::models::ResolvedSessionResponse;
use handoff_core::{AppError, Clock, SessionKind, UploadSession};
use handoff_db::SessionStore;
use handoff_processing::{
    BatchReport, MediaClass, SourceFile, TracingProgress, UploadContext, UploadExecutor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::batch::check_file_count;
use crate::issuer::parse_token;
use crate::publisher::ResultPublisher;

/// Outcome of one upload round on a handoff link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HandoffUploadResponse {
    pub report: BatchReport,
    pub summary: String,
    /// Total number of URLs attached to the session after this round
    pub session_results: usize,
}

#[derive(Clone)]
pub struct HandoffResolver {
    store: Arc<dyn SessionStore>,
    executor: UploadExecutor,
    publisher: ResultPublisher,
    clock: Arc<dyn Clock>,
    max_files: usize,
}

impl HandoffResolver {
    pub fn new(
        store: Arc<dyn SessionStore>,
        executor: UploadExecutor,
        clock: Arc<dyn Clock>,
        max_files: usize,
    ) -> Self {
        Self {
            publisher: ResultPublisher::new(store.clone()),
            store,
            executor,
            clock,
            max_files,
        }
    }

    /// Load a session for uploading. Unknown and malformed tokens are
    /// `NotFound`, sessions past `expires_at` are `SessionExpired`.
    pub async fn load(&self, token: &str) -> Result<UploadSession, AppError> {
        let token = parse_token(token)?;
        let session = self.store.get(&token).await?;

        if session.is_expired_at(self.clock.now()) {
            tracing::info!(token = %token.log_prefix(), expires_at = %session.expires_at, "Handoff link expired");
            return Err(AppError::SessionExpired(
                "This upload link has expired".to_string(),
            ));
        }
        Ok(session)
    }

    pub async fn resolve(&self, token: &str) -> Result<ResolvedSessionResponse, AppError> {
        let session = self.load(token).await?;
        Ok(ResolvedSessionResponse {
            kind: session.kind,
            state: session.state_at(self.clock.now()),
            expires_at: session.expires_at,
            uploaded: session.results.len(),
        })
    }

    /// Run one upload round: prepare and store every file, then append the
    /// successful URLs to the session. Partial batches are published.
    #[tracing::instrument(skip(self, token, files), fields(files = files.len()))]
    pub async fn upload(
        &self,
        token: &str,
        files: Vec<SourceFile>,
    ) -> Result<HandoffUploadResponse, AppError> {
        let session = self.load(token).await?;
        check_file_count(files.len(), self.max_files)?;

        let report = self
            .executor
            .run_batch_of_class(
                files,
                UploadContext::PhoneHandoff,
                Some(session.id),
                accepted_class(session.kind),
                &TracingProgress,
            )
            .await;

        let session_results = match self.publisher.publish(&session.token, &report).await? {
            Some(updated) => updated.results.len(),
            None => session.results.len(),
        };

        tracing::info!(
            token = %session.token.log_prefix(),
            kind = %session.kind,
            summary = %report.summary(),
            session_results,
            "Handoff upload round finished"
        );

        Ok(HandoffUploadResponse {
            summary: report.summary(),
            report,
            session_results,
        })
    }
}

/// Image sessions take only images and video sessions only videos.
fn accepted_class(kind: SessionKind) -> Option<MediaClass> {
    match kind {
        SessionKind::Image => Some(MediaClass::Image),
        SessionKind::Video => Some(MediaClass::Video),
        SessionKind::Mixed => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::SessionIssuer;
    use crate::test_support::{executor_with_clock, MemoryBlobs};
    use chrono::Duration;
    use handoff_core::{ErrorMetadata, ManualClock, SessionState};
    use handoff_db::InMemorySessionStore;
    use handoff_processing::FileErrorCode;

    const MB: usize = 1024 * 1024;

    struct Harness {
        clock: ManualClock,
        store: Arc<InMemorySessionStore>,
        blobs: Arc<MemoryBlobs>,
        issuer: SessionIssuer,
        resolver: HandoffResolver,
    }

    fn harness_with(blobs: MemoryBlobs, clock: ManualClock) -> Harness {
        let store = Arc::new(InMemorySessionStore::new(
            Arc::new(clock.clone()),
            Duration::minutes(60),
        ));
        let blobs = Arc::new(blobs);
        let resolver = HandoffResolver::new(
            store.clone(),
            executor_with_clock(blobs.clone(), Arc::new(clock.clone())),
            Arc::new(clock.clone()),
            10,
        );
        Harness {
            issuer: SessionIssuer::new(store.clone(), "https://movers.example.com"),
            clock,
            store,
            blobs,
            resolver,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryBlobs::default(), ManualClock::default())
    }

    fn video(name: &str, size: usize) -> SourceFile {
        SourceFile::new(name, "video/mp4", vec![7u8; size])
    }

    #[tokio::test]
    async fn video_handoff_end_to_end() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();
        let token = issued.session.token.to_string();

        h.clock.advance(Duration::minutes(5));
        let resolved = h.resolver.resolve(&token).await.unwrap();
        assert_eq!(resolved.state, SessionState::Active);

        let outcome = h
            .resolver
            .upload(&token, vec![video("walkthrough.mp4", 10 * MB)])
            .await
            .unwrap();
        assert_eq!(outcome.report.uploaded.len(), 1);
        assert_eq!(outcome.session_results, 1);

        let first = h.issuer.check_completion(&token).await.unwrap();
        assert!(first.fulfilled);
        assert_eq!(first.urls.len(), 1);

        let second = h.issuer.check_completion(&token).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(h.blobs.len(), 1);
    }

    #[tokio::test]
    async fn link_opened_after_ttl_is_expired_and_uploads_are_refused() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();
        let token = issued.session.token.to_string();

        h.clock.advance(Duration::minutes(61));

        let err = h.resolver.resolve(&token).await.unwrap_err();
        assert!(matches!(err, AppError::SessionExpired(_)));
        assert_eq!(err.http_status_code(), 410);

        let err = h
            .resolver
            .upload(&token, vec![video("late.mp4", MB)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SessionExpired(_)));
        assert_eq!(h.blobs.len(), 0);

        // A client that skips the check is still stopped by the store.
        let err = h
            .store
            .append_results(&issued.session.token, &["https://cdn/x.mp4".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, handoff_db::StoreError::Expired { .. }));
        assert!(h.store.get(&issued.session.token).await.unwrap().results.is_empty());
    }

    #[tokio::test]
    async fn expiry_during_upload_is_rejected_by_the_store() {
        let clock = ManualClock::default();
        let h = harness_with(MemoryBlobs::slow(clock.clone(), Duration::minutes(2)), clock);
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();
        let token = issued.session.token.to_string();

        h.clock.advance(Duration::minutes(59));
        let err = h
            .resolver
            .upload(&token, vec![video("slow.mp4", MB)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreWriteRejected(_)));
        assert_eq!(err.http_status_code(), 409);
        assert!(h.store.get(&issued.session.token).await.unwrap().results.is_empty());
    }

    #[tokio::test]
    async fn partial_batch_is_published() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();
        let token = issued.session.token.to_string();

        let outcome = h
            .resolver
            .upload(
                &token,
                vec![
                    video("ok.mp4", 2 * MB),
                    video("huge.mp4", 51 * MB),
                    SourceFile::new("photo.jpg", "image/jpeg", vec![1u8; 64]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.report.total, 3);
        assert_eq!(outcome.report.uploaded.len(), 1);
        let codes: Vec<_> = outcome.report.failures.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec![FileErrorCode::TooLarge, FileErrorCode::UnsupportedType]
        );
        assert_eq!(outcome.session_results, 1);
        assert!(outcome.summary.starts_with("1 of 3 uploaded, 2 failed"));
    }

    #[tokio::test]
    async fn failures_follow_submission_order() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();

        let outcome = h
            .resolver
            .upload(
                issued.session.token.as_str(),
                vec![
                    SourceFile::new("kitchen.jpg", "image/jpeg", vec![1u8; 64]),
                    video("huge.mp4", 51 * MB),
                    video("garage.mp4", 1024),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.report.total, 3);
        let failed: Vec<_> = outcome
            .report
            .failures
            .iter()
            .map(|f| (f.filename.as_str(), f.code))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("kitchen.jpg", FileErrorCode::UnsupportedType),
                ("huge.mp4", FileErrorCode::TooLarge)
            ]
        );
        assert_eq!(outcome.report.uploaded[0].filename, "garage.mp4");
        assert_eq!(h.blobs.len(), 1);
    }

    #[tokio::test]
    async fn handoff_accepts_videos_up_to_the_phone_ceiling() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Video, None).await.unwrap();

        let outcome = h
            .resolver
            .upload(
                issued.session.token.as_str(),
                vec![video("long.mp4", 40 * MB)],
            )
            .await
            .unwrap();
        assert_eq!(outcome.report.uploaded.len(), 1);
    }

    #[tokio::test]
    async fn rounds_accumulate_and_keys_use_session_id() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Mixed, None).await.unwrap();
        let token = issued.session.token.to_string();

        h.resolver
            .upload(&token, vec![video("a.mp4", 1024), video("b.mp4", 1024)])
            .await
            .unwrap();
        let second = h
            .resolver
            .upload(&token, vec![video("c.mp4", 1024)])
            .await
            .unwrap();
        assert_eq!(second.session_results, 3);

        let resolved = h.resolver.resolve(&token).await.unwrap();
        assert_eq!(resolved.state, SessionState::PartiallyFulfilled);
        assert_eq!(resolved.uploaded, 3);

        let prefix = format!("videos/{}/", issued.session.id);
        for key in h.blobs.keys() {
            assert!(key.starts_with(&prefix), "{}", key);
            assert!(!key.contains(issued.session.token.as_str()));
        }
    }

    #[tokio::test]
    async fn failed_round_makes_no_store_write() {
        let h = harness();
        let issued = h.issuer.issue(SessionKind::Image, None).await.unwrap();

        let outcome = h
            .resolver
            .upload(
                issued.session.token.as_str(),
                vec![SourceFile::new("doc.pdf", "application/pdf", vec![1u8; 10])],
            )
            .await
            .unwrap();

        assert_eq!(outcome.report.failures.len(), 1);
        assert_eq!(outcome.session_results, 0);
        assert!(!h
            .issuer
            .check_completion(issued.session.token.as_str())
            .await
            .unwrap()
            .fulfilled);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let h = harness();
        let err = h.resolver.resolve("not-a-token").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
