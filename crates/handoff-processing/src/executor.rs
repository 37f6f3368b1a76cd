//! Sequential upload executor.
//!
//! Files in a batch are prepared and uploaded strictly one after another. This
//! bounds memory and network use and gives deterministic "file i of n" progress.
//! A failing file is recorded and skipped; URLs already obtained are kept.

use handoff_core::Clock;
use handoff_storage::{generate_storage_key, Storage, StorageError};
use std::sync::Arc;
use uuid::Uuid;

use crate::media::{MediaClass, PreparedFile, SourceFile, UploadedAsset};
use crate::pipeline::{MediaPreparer, UploadContext};
use crate::report::{BatchReport, FileError, FileFailure};
use crate::validator::ValidationError;

/// Observer for per-file progress. Indices are 1-based.
pub trait UploadProgress: Send + Sync {
    fn on_file_started(&self, index: usize, total: usize, filename: &str);

    fn on_file_finished(&self, index: usize, total: usize, filename: &str, succeeded: bool);
}

/// Progress reporter that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl UploadProgress for TracingProgress {
    fn on_file_started(&self, index: usize, total: usize, filename: &str) {
        tracing::debug!(index, total, filename = %filename, "Processing {}/{}", index, total);
    }

    fn on_file_finished(&self, index: usize, total: usize, filename: &str, succeeded: bool) {
        tracing::debug!(index, total, filename = %filename, succeeded, "Finished {}/{}", index, total);
    }
}

#[derive(Clone)]
pub struct UploadExecutor {
    storage: Arc<dyn Storage>,
    preparer: MediaPreparer,
    clock: Arc<dyn Clock>,
}

impl UploadExecutor {
    pub fn new(storage: Arc<dyn Storage>, preparer: MediaPreparer, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            preparer,
            clock,
        }
    }

    pub fn preparer(&self) -> &MediaPreparer {
        &self.preparer
    }

    /// Write one prepared file under a fresh key and return its public URL.
    pub async fn upload(
        &self,
        file: PreparedFile,
        namespace: Option<&str>,
    ) -> Result<UploadedAsset, StorageError> {
        let key = generate_storage_key(
            file.class.folder(),
            namespace,
            &file.extension,
            self.clock.now(),
        );
        let size_bytes = file.data.len();
        let url = self
            .storage
            .put(&key, Vec::from(file.data), &file.content_type)
            .await?;

        Ok(UploadedAsset {
            filename: file.original_name,
            url,
            content_type: file.content_type,
            size_bytes,
        })
    }

    /// Prepare and upload every file in order, collecting successes and failures.
    ///
    /// `namespace` scopes storage keys (the owning session id for handoff uploads).
    pub async fn run_batch(
        &self,
        files: Vec<SourceFile>,
        context: UploadContext,
        namespace: Option<Uuid>,
        progress: &dyn UploadProgress,
    ) -> BatchReport {
        self.run_batch_of_class(files, context, namespace, None, progress)
            .await
    }

    /// Like [`run_batch`](Self::run_batch), but files outside `only` fail as
    /// unsupported in their submitted position.
    pub async fn run_batch_of_class(
        &self,
        files: Vec<SourceFile>,
        context: UploadContext,
        namespace: Option<Uuid>,
        only: Option<MediaClass>,
        progress: &dyn UploadProgress,
    ) -> BatchReport {
        let total = files.len();
        let namespace = namespace.map(|id| id.to_string());
        let mut report = BatchReport::new(total);
        let start = std::time::Instant::now();

        for (i, file) in files.into_iter().enumerate() {
            let index = i + 1;
            let filename = file.name.clone();
            progress.on_file_started(index, total, &filename);

            let outcome = match check_class(&file, only) {
                Err(e) => Err(FileError::from(e)),
                Ok(()) => match self.preparer.prepare(file, context).await {
                    Ok(prepared) => self
                        .upload(prepared, namespace.as_deref())
                        .await
                        .map_err(FileError::from),
                    Err(e) => Err(FileError::from(e)),
                },
            };

            match outcome {
                Ok(asset) => {
                    report.uploaded.push(asset);
                    progress.on_file_finished(index, total, &filename, true);
                }
                Err(e) => {
                    tracing::warn!(
                        filename = %filename,
                        code = ?e.code(),
                        error = %e,
                        "File skipped in upload batch"
                    );
                    report.failures.push(FileFailure::new(filename.clone(), &e));
                    progress.on_file_finished(index, total, &filename, false);
                }
            }
        }

        tracing::info!(
            total,
            uploaded = report.uploaded.len(),
            failed = report.failures.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch finished"
        );

        report
    }
}

fn check_class(file: &SourceFile, only: Option<MediaClass>) -> Result<(), ValidationError> {
    match (only, MediaClass::classify(&file.content_type)) {
        (Some(want), Some(got)) if want != got => Err(ValidationError::UnsupportedType {
            content_type: file.content_type.clone(),
        }),
        _ => Ok(()),
    }
}
