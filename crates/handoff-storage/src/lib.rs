//! Handoff Storage Library
//!
//! Durable blob storage for uploaded media. Every backend exposes the same
//! `put(key, bytes, content_type) -> public_url` contract through the [`Storage`] trait.
//!
//! # Storage key format
//!
//! `{folder}/{namespace/}{unix_millis}-{random}.{ext}` where `folder` is `images` or
//! `videos` and the namespace, when present, is the owning session id. Keys must not
//! contain `..` or a leading `/`. Key generation lives in the [`keys`] module so all
//! callers stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use handoff_core::StorageBackend;
pub use keys::generate_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
