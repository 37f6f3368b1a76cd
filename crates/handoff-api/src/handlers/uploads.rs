use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use handoff_services::BatchReport;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::extract_source_files;

/// Direct multi-file upload from the desktop
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch finished, possibly with per-file failures", body = BatchReport),
        (status = 400, description = "No files or too many files", body = ErrorResponse),
        (status = 413, description = "Request too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_batch"))]
pub async fn upload_batch(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, HttpAppError> {
    let files = extract_source_files(multipart, state.batch.max_files()).await?;
    let report = state.batch.upload(files).await?;
    Ok(Json(report))
}
