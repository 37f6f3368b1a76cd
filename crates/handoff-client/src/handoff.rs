//! Issuer-side bookkeeping for a handoff in flight.

use handoff_core::models::{CompletionStatus, IssuedSessionResponse, SessionKind};
use std::path::Path;

/// A session this device issued and is waiting on.
///
/// Consuming it with [`PendingHandoff::try_consume`] hands back the uploaded
/// URLs and drops the token; nothing else is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandoff {
    pub token: String,
    pub handoff_url: String,
    pub kind: SessionKind,
}

impl From<IssuedSessionResponse> for PendingHandoff {
    fn from(issued: IssuedSessionResponse) -> Self {
        Self {
            token: issued.token,
            handoff_url: issued.handoff_url,
            kind: issued.kind,
        }
    }
}

impl PendingHandoff {
    /// Take the results if the session is fulfilled, otherwise get the pending
    /// handoff back to check again later.
    pub fn try_consume(self, status: CompletionStatus) -> Result<Vec<String>, PendingHandoff> {
        if status.fulfilled && !status.urls.is_empty() {
            Ok(status.urls)
        } else {
            Err(self)
        }
    }
}

/// Media lists of the site-builder form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFields {
    pub gallery: Vec<String>,
    pub videos: Vec<String>,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "3gp", "avi", "mkv"];

impl MediaFields {
    /// Append consumed URLs to the list matching the session kind. Mixed
    /// sessions are split by file extension. URLs already present are skipped.
    pub fn merge(&mut self, kind: SessionKind, urls: Vec<String>) {
        for url in urls {
            let target = match kind {
                SessionKind::Image => &mut self.gallery,
                SessionKind::Video => &mut self.videos,
                SessionKind::Mixed if looks_like_video(&url) => &mut self.videos,
                SessionKind::Mixed => &mut self.gallery,
            };
            if !target.contains(&url) {
                target.push(url);
            }
        }
    }
}

fn looks_like_video(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(kind: SessionKind) -> PendingHandoff {
        PendingHandoff {
            token: "t".repeat(43),
            handoff_url: format!("https://movers.example.com/upload/{}", "t".repeat(43)),
            kind,
        }
    }

    #[test]
    fn unfulfilled_status_returns_the_pending_handoff() {
        let p = pending(SessionKind::Video);
        let back = p
            .clone()
            .try_consume(CompletionStatus::from_results(vec![]))
            .unwrap_err();
        assert_eq!(back, p);
    }

    #[test]
    fn fulfilled_status_yields_urls() {
        let urls = vec!["https://cdn/videos/a.mp4".to_string()];
        let consumed = pending(SessionKind::Video)
            .try_consume(CompletionStatus::from_results(urls.clone()))
            .unwrap();
        assert_eq!(consumed, urls);
    }

    #[test]
    fn merge_routes_by_kind() {
        let mut fields = MediaFields {
            gallery: vec!["https://cdn/images/existing.jpg".to_string()],
            videos: Vec::new(),
        };

        fields.merge(
            SessionKind::Image,
            vec!["https://cdn/images/new.webp".to_string()],
        );
        fields.merge(
            SessionKind::Video,
            vec!["https://cdn/videos/tour.mp4".to_string()],
        );
        fields.merge(
            SessionKind::Mixed,
            vec![
                "https://cdn/videos/clip.MOV?v=1".to_string(),
                "https://cdn/images/porch.jpg".to_string(),
                "https://cdn/images/existing.jpg".to_string(),
            ],
        );

        assert_eq!(
            fields.gallery,
            vec![
                "https://cdn/images/existing.jpg",
                "https://cdn/images/new.webp",
                "https://cdn/images/porch.jpg",
            ]
        );
        assert_eq!(
            fields.videos,
            vec!["https://cdn/videos/tour.mp4", "https://cdn/videos/clip.MOV?v=1"]
        );
    }
}
