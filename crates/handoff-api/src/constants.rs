//! API paths.

/// Versioned prefix of every JSON route.
pub const API_PREFIX: &str = "/api/v0";

/// Where local-storage blobs are served from; matches the default
/// `LOCAL_STORAGE_BASE_URL` of `{PUBLIC_ORIGIN}/media`.
pub const MEDIA_ROUTE: &str = "/media";

pub const OPENAPI_ROUTE: &str = "/api-docs/openapi.json";

/// Upper bound on requests handled at once.
pub const HTTP_CONCURRENCY_LIMIT: usize = 1024;
