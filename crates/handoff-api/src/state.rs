//! Application state shared by every handler.

use handoff_core::Config;
use handoff_services::{
    DirectBatchUploader, HandoffResolver, SessionIssuer, SessionStore, Storage,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SessionStore>,
    pub storage: Arc<dyn Storage>,
    pub issuer: SessionIssuer,
    pub resolver: HandoffResolver,
    pub batch: DirectBatchUploader,
}
