//! Batch outcome: successes and per-file failures side by side.

use handoff_storage::StorageError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::media::UploadedAsset;
use crate::validator::ValidationError;

/// Why a single file did not make it into storage.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upload(#[from] StorageError),
}

impl FileError {
    pub fn code(&self) -> FileErrorCode {
        match self {
            FileError::Validation(ValidationError::UnsupportedType { .. }) => {
                FileErrorCode::UnsupportedType
            }
            FileError::Validation(ValidationError::FileTooLarge { .. }) => FileErrorCode::TooLarge,
            FileError::Validation(ValidationError::EmptyFile) => FileErrorCode::EmptyFile,
            FileError::Upload(_) => FileErrorCode::UploadFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorCode {
    UnsupportedType,
    TooLarge,
    EmptyFile,
    UploadFailed,
}

impl FileErrorCode {
    /// Short label for summaries ("too large").
    pub fn label(self) -> &'static str {
        match self {
            FileErrorCode::UnsupportedType => "unsupported type",
            FileErrorCode::TooLarge => "too large",
            FileErrorCode::EmptyFile => "empty file",
            FileErrorCode::UploadFailed => "upload failed",
        }
    }
}

/// A failure recorded against the file's original name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileFailure {
    pub filename: String,
    pub code: FileErrorCode,
    pub message: String,
}

impl FileFailure {
    pub fn new(filename: impl Into<String>, error: &FileError) -> Self {
        Self {
            filename: filename.into(),
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Result of one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Number of files submitted
    pub total: usize,
    /// Successfully stored files, in submission order
    pub uploaded: Vec<UploadedAsset>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            uploaded: Vec::with_capacity(total),
            failures: Vec::new(),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.uploaded.iter().map(|a| a.url.clone()).collect()
    }

    pub fn has_uploads(&self) -> bool {
        !self.uploaded.is_empty()
    }

    /// e.g. `3 of 5 uploaded, 2 failed: a.mov (too large), b.jpg (upload failed)`
    pub fn summary(&self) -> String {
        let mut summary = format!("{} of {} uploaded", self.uploaded.len(), self.total);
        if !self.failures.is_empty() {
            let details: Vec<String> = self
                .failures
                .iter()
                .map(|f| format!("{} ({})", f.filename, f.code.label()))
                .collect();
            summary.push_str(&format!(
                ", {} failed: {}",
                self.failures.len(),
                details.join(", ")
            ));
        }
        summary
    }
}
