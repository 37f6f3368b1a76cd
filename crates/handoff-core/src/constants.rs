//! Default limits and fixed paths.

/// Default lifetime of a handoff session (1 hour).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// Path template segment for handoff links: `{origin}/upload/{token}`.
pub const HANDOFF_PATH_PREFIX: &str = "/upload";

pub const IMAGE_MAX_DIMENSION: u32 = 1920;
pub const IMAGE_MAX_OUTPUT_MB: usize = 1;
/// Decoder memory guard; well above camera output so it never gates real photos.
pub const IMAGE_MAX_INPUT_MB: usize = 100;

/// Video ceiling for the desktop multi-file batch.
pub const BATCH_VIDEO_MAX_MB: usize = 25;
/// Video ceiling for the single-file phone handoff path.
pub const HANDOFF_VIDEO_MAX_MB: usize = 50;

pub const MAX_FILES_PER_BATCH: usize = 10;

pub const SWEEPER_INTERVAL_SECS: u64 = 3600;
/// Sessions are reclaimed this long after they expire.
pub const SWEEPER_GRACE_SECS: i64 = 86_400;

pub const BYTES_PER_MB: usize = 1024 * 1024;
