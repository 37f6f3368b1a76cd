//! Service wiring

use handoff_core::{Clock, Config};
use handoff_services::{
    DirectBatchUploader, HandoffResolver, MediaPreparer, PipelineLimits, SessionIssuer,
    SessionStore, SessionSweeper, Storage, UploadExecutor,
};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// Build the issuer, resolver and batch uploader over the given store and storage.
pub fn initialize_services(
    config: &Config,
    store: Arc<dyn SessionStore>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
) -> Arc<AppState> {
    let preparer = MediaPreparer::new(PipelineLimits::from_config(config));
    let executor = UploadExecutor::new(storage.clone(), preparer, clock.clone());

    let issuer = SessionIssuer::new(store.clone(), config.public_origin());
    let resolver = HandoffResolver::new(
        store.clone(),
        executor.clone(),
        clock,
        config.max_files_per_batch(),
    );
    let batch = DirectBatchUploader::new(executor, config.max_files_per_batch());

    Arc::new(AppState {
        config: config.clone(),
        store,
        storage,
        issuer,
        resolver,
        batch,
    })
}

pub fn start_sweeper(
    config: &Config,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
) -> tokio::task::JoinHandle<()> {
    let interval_secs = config.sweeper_interval_secs().max(1);
    tracing::info!(
        interval_secs,
        grace_secs = config.sweeper_grace().num_seconds(),
        "Starting expired session sweeper"
    );

    Arc::new(SessionSweeper::new(
        store,
        clock,
        config.sweeper_grace(),
        Duration::from_secs(interval_secs),
    ))
    .start()
}
