//! Direct multi-file upload from the desktop site builder.
//!
//! Same pipeline as the phone handoff but with the batch video ceiling, no
//! session, and a cap on the number of files per request.

use handoff_core::AppError;
use handoff_processing::{
    BatchReport, SourceFile, TracingProgress, UploadContext, UploadExecutor, UploadProgress,
};

#[derive(Clone)]
pub struct DirectBatchUploader {
    executor: UploadExecutor,
    max_files: usize,
}

impl DirectBatchUploader {
    pub fn new(executor: UploadExecutor, max_files: usize) -> Self {
        Self {
            executor,
            max_files,
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub async fn upload(&self, files: Vec<SourceFile>) -> Result<BatchReport, AppError> {
        self.upload_with_progress(files, &TracingProgress).await
    }

    /// Rejects empty and oversized batches before anything is uploaded.
    pub async fn upload_with_progress(
        &self,
        files: Vec<SourceFile>,
        progress: &dyn UploadProgress,
    ) -> Result<BatchReport, AppError> {
        check_file_count(files.len(), self.max_files)?;

        let report = self
            .executor
            .run_batch(files, UploadContext::DesktopBatch, None, progress)
            .await;

        tracing::info!(summary = %report.summary(), "Direct batch uploaded");
        Ok(report)
    }
}

pub(crate) fn check_file_count(count: usize, max_files: usize) -> Result<(), AppError> {
    if count == 0 {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }
    if count > max_files {
        return Err(AppError::InvalidInput(format!(
            "Too many files: {} (maximum {} per upload)",
            count, max_files
        )));
    }
    Ok(())
}
