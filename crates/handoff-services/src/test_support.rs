use async_trait::async_trait;
use chrono::Duration;
use handoff_core::{Clock, ManualClock, StorageBackend, SystemClock};
use handoff_processing::{MediaPreparer, PipelineLimits, UploadExecutor};
use handoff_storage::{Storage, StorageError, StorageResult};
use std::sync::{Arc, Mutex};

/// Blob store kept in memory. Optionally moves a manual clock forward on every
/// put to simulate slow uploads.
#[derive(Default)]
pub struct MemoryBlobs {
    blobs: Mutex<Vec<(String, Vec<u8>)>>,
    slow: Option<(ManualClock, Duration)>,
}

impl MemoryBlobs {
    pub fn slow(clock: ManualClock, per_put: Duration) -> Self {
        Self {
            blobs: Mutex::default(),
            slow: Some((clock, per_put)),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl Storage for MemoryBlobs {
    async fn put(&self, storage_key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        if let Some((clock, step)) = &self.slow {
            clock.advance(*step);
        }
        self.blobs
            .lock()
            .unwrap()
            .push((storage_key.to_string(), data));
        Ok(format!("https://cdn.example.com/{}", storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == storage_key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.blobs.lock().unwrap().iter().any(|(k, _)| k == storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub fn executor(storage: Arc<dyn Storage>) -> UploadExecutor {
    executor_with_clock(storage, Arc::new(SystemClock))
}

pub fn executor_with_clock(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> UploadExecutor {
    UploadExecutor::new(storage, MediaPreparer::new(PipelineLimits::default()), clock)
}
