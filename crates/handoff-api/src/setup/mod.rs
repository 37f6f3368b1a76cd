//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use handoff_core::{Clock, Config, SystemClock};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format())
        .context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment(),
        session_store = %config.session_store(),
        storage_backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = database::setup_session_store(&config, clock.clone()).await?;
    let storage = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, store, storage, clock.clone());
    if config.sweeper_enabled() {
        services::start_sweeper(&config, state.store.clone(), clock);
    }

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
