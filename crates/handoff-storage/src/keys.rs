//! Shared key generation for storage backends.
//!
//! Key format: `{folder}/{namespace/}{unix_millis}-{8 alphanumerics}.{ext}`.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;

const RANDOM_SUFFIX_LEN: usize = 8;
const MAX_EXTENSION_LEN: usize = 10;
const FALLBACK_EXTENSION: &str = "bin";

/// Generate a collision-resistant storage key.
///
/// The time prefix keeps keys roughly ordered by upload time; the random suffix
/// separates files written within the same millisecond. `extension` is normalized
/// to lowercase ASCII alphanumerics and replaced with `bin` when unusable.
pub fn generate_storage_key(
    folder: &str,
    namespace: Option<&str>,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    let extension = normalize_extension(extension);
    let file_name = format!("{}-{}.{}", now.timestamp_millis(), suffix, extension);

    match namespace.map(sanitize_segment).filter(|ns| !ns.is_empty()) {
        Some(ns) => format!("{}/{}/{}", sanitize_segment(folder), ns, file_name),
        None => format!("{}/{}", sanitize_segment(folder), file_name),
    }
}

fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        FALLBACK_EXTENSION.to_string()
    } else {
        ext
    }
}

// Path segments keep only characters that cannot form traversal sequences.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
