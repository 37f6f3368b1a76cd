use handoff_core::SessionKind;

/// Initialize tracing for the CLI. Logs go to stderr so JSON output stays clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// clap value parser for `--kind`.
pub fn parse_kind(s: &str) -> anyhow::Result<SessionKind> {
    s.parse()
}

/// Token from either a bare token or a full handoff link.
pub fn token_from_arg(arg: &str) -> &str {
    let trimmed = arg.trim().trim_end_matches('/');
    match trimmed.rsplit_once("/upload/") {
        Some((_, token)) => token,
        None => trimmed,
    }
}
