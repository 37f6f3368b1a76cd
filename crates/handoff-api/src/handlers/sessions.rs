//! Issuer routes: open a session, render its code, check for results.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use handoff_core::models::{CompletionStatus, CreateSessionRequest, IssuedSessionResponse};
use handoff_core::AppError;
use validator::Validate;

use super::token_prefix;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Open a new handoff session
///
/// Returns the token and the `{origin}/upload/{token}` link to share with the
/// other device.
#[utoipa::path(
    post,
    path = "/api/v0/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = IssuedSessionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(kind = %request.kind, operation = "create_session"))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<IssuedSessionResponse>), HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let issued = state.issuer.issue(request.kind, request.owner_ref).await?;
    tracing::info!(
        token = %issued.session.token.log_prefix(),
        expires_at = %issued.session.expires_at,
        "Handoff session issued"
    );

    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Check whether the other device has uploaded anything yet
///
/// An empty result list is a normal "not yet" answer.
#[utoipa::path(
    get,
    path = "/api/v0/sessions/{token}/status",
    tag = "sessions",
    params(("token" = String, Path, description = "Handoff token")),
    responses(
        (status = 200, description = "Current results", body = CompletionStatus),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(token = %token_prefix(&token), operation = "session_status"))]
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<CompletionStatus>, HttpAppError> {
    let status = state.issuer.check_completion(&token).await?;
    Ok(Json(status))
}

/// Scannable QR code of the session's handoff link
#[utoipa::path(
    get,
    path = "/api/v0/sessions/{token}/qr.svg",
    tag = "sessions",
    params(("token" = String, Path, description = "Handoff token")),
    responses(
        (status = 200, description = "SVG QR code", content_type = "image/svg+xml", body = String),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, token), fields(token = %token_prefix(&token), operation = "session_qr"))]
pub async fn session_qr(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let svg = state.issuer.qr_svg_for(&token).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}
