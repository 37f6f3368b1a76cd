//! Resolver routes, reached from the handoff link on the receiving device.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use handoff_core::models::ResolvedSessionResponse;
use handoff_services::HandoffUploadResponse;

use super::token_prefix;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::extract_source_files;

/// Resolve a handoff link
#[utoipa::path(
    get,
    path = "/api/v0/handoff/{token}",
    tag = "handoff",
    params(("token" = String, Path, description = "Handoff token")),
    responses(
        (status = 200, description = "Session is open for uploads", body = ResolvedSessionResponse),
        (status = 404, description = "Link not found", body = ErrorResponse),
        (status = 410, description = "Link expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(token = %token_prefix(&token), operation = "resolve_handoff"))]
pub async fn resolve_handoff(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ResolvedSessionResponse>, HttpAppError> {
    let resolved = state.resolver.resolve(&token).await?;
    Ok(Json(resolved))
}

/// Upload one round of files into a handoff session
///
/// Files that fail validation or storage are reported next to the successes;
/// the successful URLs are appended to the session.
#[utoipa::path(
    post,
    path = "/api/v0/handoff/{token}/files",
    tag = "handoff",
    params(("token" = String, Path, description = "Handoff token")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload round finished", body = HandoffUploadResponse),
        (status = 400, description = "No files or too many files", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse),
        (status = 409, description = "Link expired while uploading", body = ErrorResponse),
        (status = 410, description = "Link expired", body = ErrorResponse),
        (status = 413, description = "Request too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token, multipart), fields(token = %token_prefix(&token), operation = "upload_to_handoff"))]
pub async fn upload_to_handoff(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    multipart: Multipart,
) -> Result<Json<HandoffUploadResponse>, HttpAppError> {
    // Fail fast before reading a large body into memory.
    state.resolver.load(&token).await?;

    let files = extract_source_files(multipart, state.config.max_files_per_batch()).await?;
    let outcome = state.resolver.upload(&token, files).await?;
    Ok(Json(outcome))
}
