//! HTTP client for the handoff API.
//!
//! Provides generic GET/POST helpers over reqwest, the domain methods for both
//! handoff roles ([`api`]) and the issuer-side bookkeeping that turns a
//! fulfilled session into form fields ([`handoff`]). The CLI uses this crate
//! directly.

pub mod api;
pub mod handoff;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

pub use api::{BatchReport, FileFailure, HandoffUploadResponse, UploadedAsset};
pub use handoff::{MediaFields, PendingHandoff};
pub use handoff_core::models::{
    CompletionStatus, IssuedSessionResponse, ResolvedSessionResponse, SessionKind, SessionState,
};

/// API version prefix.
pub const API_PREFIX: &str = "/api/v0";

const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Non-success response from the API, decoded from its JSON error body when possible.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed with status {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
    pub recoverable: bool,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_expired(&self) -> bool {
        self.status == 410
    }

    fn from_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: String,
            code: Option<String>,
            #[serde(default)]
            recoverable: bool,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                status,
                code: parsed.code,
                message: parsed.error,
                recoverable: parsed.recoverable,
            },
            Err(_) => Self {
                status,
                code: None,
                message: if body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body.to_string()
                },
                recoverable: status >= 500,
            },
        }
    }
}

/// HTTP client for the handoff API.
#[derive(Clone, Debug)]
pub struct HandoffClient {
    client: Client,
    base_url: String,
}

impl HandoffClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: HANDOFF_API_URL (default http://localhost:4000).
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("HANDOFF_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET and deserialize a JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.build_url(path))
            .send()
            .await
            .context("Failed to send request")?;
        Self::json_body(response).await
    }

    /// GET and return the body as text.
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let response = self
            .client
            .get(self.build_url(path))
            .send()
            .await
            .context("Failed to send request")?;
        let response = Self::check_status(response).await?;
        response.text().await.context("Failed to read response body")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.build_url(path))
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;
        Self::json_body(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.build_url(path))
            .multipart(form)
            .send()
            .await
            .context("Failed to send request")?;
        Self::json_body(response).await
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body).into())
    }

    async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }
}
