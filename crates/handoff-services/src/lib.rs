//! Handoff Services Layer
//!
//! The business service layer: the two roles of the handoff protocol (issuer and
//! resolver), result publishing, direct desktop batches and the expired-session
//! sweeper. Storage, store and pipeline types are re-exported so the API crate
//! depends on a single service facade. Keep thin HTTP handling in handoff-api.

pub mod batch;
pub mod issuer;
pub mod publisher;
pub mod resolver;
pub mod sweeper;

pub use batch::DirectBatchUploader;
pub use issuer::{IssuedSession, SessionIssuer};
pub use publisher::ResultPublisher;
pub use resolver::{HandoffResolver, HandoffUploadResponse};
pub use sweeper::SessionSweeper;

pub use handoff_db::{InMemorySessionStore, PgSessionStore, SessionStore, StoreError};
pub use handoff_processing::{
    BatchReport, FileErrorCode, FileFailure, MediaPreparer, PipelineLimits, SourceFile,
    TracingProgress, UploadContext, UploadExecutor, UploadProgress, UploadedAsset,
};
pub use handoff_storage::{
    create_storage, LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult,
};

#[cfg(test)]
mod test_support;
