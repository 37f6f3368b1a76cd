//! Domain methods for the handoff API client.
//!
//! Session types come from `handoff_core::models`; upload report types are
//! mirrored here so the client does not pull in the media pipeline.

use crate::{HandoffClient, API_PREFIX};
use anyhow::{Context, Result};
use handoff_core::models::{
    CompletionStatus, CreateSessionRequest, IssuedSessionResponse, ResolvedSessionResponse,
    SessionKind,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A stored file. Matches the API's `UploadedAsset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// A file that was skipped; `code` is one of `unsupported_type`, `too_large`,
/// `empty_file` or `upload_failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub filename: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub uploaded: Vec<UploadedAsset>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn urls(&self) -> Vec<String> {
        self.uploaded.iter().map(|a| a.url.clone()).collect()
    }
}

/// Response of `POST /handoff/{token}/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffUploadResponse {
    pub report: BatchReport,
    pub summary: String,
    pub session_results: usize,
}

impl HandoffClient {
    /// Open a new handoff session.
    pub async fn issue(
        &self,
        kind: SessionKind,
        owner_ref: Option<String>,
    ) -> Result<IssuedSessionResponse> {
        self.post_json(
            &format!("{}/sessions", API_PREFIX),
            &CreateSessionRequest { kind, owner_ref },
        )
        .await
    }

    /// One completion check. Empty `urls` means the other device has not uploaded yet.
    pub async fn status(&self, token: &str) -> Result<CompletionStatus> {
        self.get(&format!("{}/sessions/{}/status", API_PREFIX, token))
            .await
    }

    /// SVG QR code for the session's handoff link.
    pub async fn qr_svg(&self, token: &str) -> Result<String> {
        self.get_text(&format!("{}/sessions/{}/qr.svg", API_PREFIX, token))
            .await
    }

    /// Resolve a handoff link as the receiving device.
    pub async fn resolve(&self, token: &str) -> Result<ResolvedSessionResponse> {
        self.get(&format!("{}/handoff/{}", API_PREFIX, token)).await
    }

    /// Upload local files into a handoff session.
    pub async fn upload_to_session<P: AsRef<Path>>(
        &self,
        token: &str,
        files: &[P],
    ) -> Result<HandoffUploadResponse> {
        let form = multipart_form(files)?;
        self.post_multipart(&format!("{}/handoff/{}/files", API_PREFIX, token), form)
            .await
    }

    /// Direct multi-file upload without a session.
    pub async fn upload_batch<P: AsRef<Path>>(&self, files: &[P]) -> Result<BatchReport> {
        let form = multipart_form(files)?;
        self.post_multipart(&format!("{}/uploads", API_PREFIX), form)
            .await
    }
}

fn multipart_form<P: AsRef<Path>>(files: &[P]) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();

    for path in files {
        let path = path.as_ref();
        if path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str(mime_for_path(path))
            .context("Invalid MIME type")?;
        form = form.part("file", part);
    }

    Ok(form)
}

/// Declared content type for a local file, from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "3gp" => "video/3gpp",
        _ => "application/octet-stream",
    }
}
