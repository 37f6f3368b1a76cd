//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use handoff_core::models;
use handoff_services as services;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Handoff API",
        version = "0.1.0",
        description = "Cross-device media handoff (v0). A desktop issues a short-lived upload session, a phone resolves the link and uploads images or videos into it, and the desktop collects the resulting URLs. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Issuer
        handlers::sessions::create_session,
        handlers::sessions::session_status,
        handlers::sessions::session_qr,
        // Resolver
        handlers::handoff::resolve_handoff,
        handlers::handoff::upload_to_handoff,
        // Direct uploads
        handlers::uploads::upload_batch,
    ),
    components(schemas(
        models::SessionKind,
        models::SessionState,
        models::CreateSessionRequest,
        models::IssuedSessionResponse,
        models::CompletionStatus,
        models::ResolvedSessionResponse,
        services::BatchReport,
        services::UploadedAsset,
        services::FileFailure,
        services::FileErrorCode,
        services::HandoffUploadResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "sessions", description = "Issue handoff sessions and poll for results"),
        (name = "handoff", description = "Resolve a handoff link and upload into it"),
        (name = "uploads", description = "Direct multi-file uploads"),
    )
)]
pub struct ApiDoc;
