//! Media preparation and upload pipeline
//!
//! Each selected file is classified, validated and (for images) compressed by the
//! [`MediaPreparer`], then written to blob storage by the [`UploadExecutor`], one file
//! at a time. Per-file failures never abort the batch; they are collected in a
//! [`BatchReport`] next to the successes.

#[cfg(feature = "image")]
pub mod compression;
pub mod executor;
pub mod media;
pub mod pipeline;
pub mod report;
pub mod validator;

#[cfg(feature = "image")]
pub use compression::{CompressedImage, CompressionError, CompressionPolicy, ImageCompressor};
pub use executor::{TracingProgress, UploadExecutor, UploadProgress};
pub use media::{MediaClass, PreparedFile, SourceFile, UploadedAsset};
pub use pipeline::{MediaPreparer, PipelineLimits, UploadContext};
pub use report::{BatchReport, FileError, FileErrorCode, FileFailure};
pub use validator::{MediaValidator, ValidationError};
