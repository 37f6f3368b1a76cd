//! Handoff API Library
//!
//! HTTP handlers for issuing, resolving, uploading into and polling handoff
//! sessions, plus direct desktop batches, health probes and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
