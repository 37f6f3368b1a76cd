pub mod handoff;
pub mod sessions;
pub mod uploads;

/// Loggable prefix of a token taken from the path.
pub(crate) fn token_prefix(raw: &str) -> &str {
    raw.get(..8).unwrap_or(raw)
}
