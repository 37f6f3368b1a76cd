//! Handoff Core Library
//!
//! Domain models, the handoff token, the clock abstraction, configuration and the
//! unified error type shared by every crate in the workspace.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod token;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BaseConfig, Config, HandoffConfig, SessionStoreBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{SessionKind, SessionState, UploadSession};
pub use storage_types::StorageBackend;
pub use token::{HandoffToken, InvalidToken, RandomTokenGenerator, TokenGenerator};
