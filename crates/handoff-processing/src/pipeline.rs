//! Per-file preparation: validate → compress (images) → prepared file.
//!
//! Shared by the desktop multi-file uploader and the phone handoff path. The two
//! paths differ only in their video ceiling, selected through [`UploadContext`].

use handoff_core::Config;

#[cfg(feature = "image")]
use crate::compression::{CompressionError, CompressionPolicy, ImageCompressor};
use crate::media::{extension_for_mime, extension_from_filename, MediaClass, PreparedFile, SourceFile};
use crate::validator::{MediaValidator, ValidationError};

/// Which client is driving the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadContext {
    /// Multi-file upload from the site builder
    DesktopBatch,
    /// Upload from a phone that resolved a handoff link
    PhoneHandoff,
}

/// Size and compression limits for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineLimits {
    pub image_max_input_bytes: usize,
    pub image_max_dimension: u32,
    pub image_max_output_bytes: usize,
    pub batch_video_max_bytes: usize,
    pub handoff_video_max_bytes: usize,
}

impl PipelineLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_max_input_bytes: config.image_max_input_bytes(),
            image_max_dimension: config.image_max_dimension(),
            image_max_output_bytes: config.image_max_output_bytes(),
            batch_video_max_bytes: config.batch_video_max_bytes(),
            handoff_video_max_bytes: config.handoff_video_max_bytes(),
        }
    }
}

impl Default for PipelineLimits {
    fn default() -> Self {
        use handoff_core::constants::*;
        Self {
            image_max_input_bytes: IMAGE_MAX_INPUT_MB * BYTES_PER_MB,
            image_max_dimension: IMAGE_MAX_DIMENSION,
            image_max_output_bytes: IMAGE_MAX_OUTPUT_MB * BYTES_PER_MB,
            batch_video_max_bytes: BATCH_VIDEO_MAX_MB * BYTES_PER_MB,
            handoff_video_max_bytes: HANDOFF_VIDEO_MAX_MB * BYTES_PER_MB,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaPreparer {
    limits: PipelineLimits,
    batch_validator: MediaValidator,
    handoff_validator: MediaValidator,
}

impl MediaPreparer {
    pub fn new(limits: PipelineLimits) -> Self {
        Self {
            limits,
            batch_validator: MediaValidator::new(
                limits.image_max_input_bytes,
                limits.batch_video_max_bytes,
            ),
            handoff_validator: MediaValidator::new(
                limits.image_max_input_bytes,
                limits.handoff_video_max_bytes,
            ),
        }
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    fn validator(&self, context: UploadContext) -> &MediaValidator {
        match context {
            UploadContext::DesktopBatch => &self.batch_validator,
            UploadContext::PhoneHandoff => &self.handoff_validator,
        }
    }

    /// Prepare one file for upload.
    ///
    /// Only validation can fail. Compression problems fall back to the original bytes.
    pub async fn prepare(
        &self,
        file: SourceFile,
        context: UploadContext,
    ) -> Result<PreparedFile, ValidationError> {
        let class = self.validator(context).validate(&file)?;

        match class {
            MediaClass::Video => Ok(Self::unchanged(file, class)),
            MediaClass::Image => Ok(self.prepare_image(file).await),
        }
    }

    #[cfg(feature = "image")]
    async fn prepare_image(&self, file: SourceFile) -> PreparedFile {
        let policy = CompressionPolicy {
            max_dimension: self.limits.image_max_dimension,
            max_output_bytes: self.limits.image_max_output_bytes,
        };
        let data = file.data.clone();
        let content_type = file.content_type.clone();

        // Image encode is CPU-bound; run off the async pool. A panic inside the
        // encoder surfaces as a JoinError and is handled like any other failure.
        let result = tokio::task::spawn_blocking(move || {
            ImageCompressor::compress(&data, &content_type, &policy)
        })
        .await
        .unwrap_or_else(|e| Err(CompressionError::TaskFailed(e.to_string())));

        match result {
            Ok(compressed) if compressed.passthrough => Self::unchanged(file, MediaClass::Image),
            Ok(compressed) => {
                tracing::info!(
                    filename = %file.name,
                    original_bytes = file.size(),
                    size_bytes = compressed.data.len(),
                    width = compressed.width,
                    height = compressed.height,
                    "Image compressed for upload"
                );
                PreparedFile {
                    original_name: file.name,
                    class: MediaClass::Image,
                    content_type: compressed.format.to_mime_type().to_string(),
                    extension: compressed.format.extension().to_string(),
                    data: compressed.data,
                    compressed: true,
                }
            }
            Err(e) => {
                tracing::warn!(
                    filename = %file.name,
                    error = %e,
                    "Image compression failed, uploading original"
                );
                Self::unchanged(file, MediaClass::Image)
            }
        }
    }

    #[cfg(not(feature = "image"))]
    async fn prepare_image(&self, file: SourceFile) -> PreparedFile {
        Self::unchanged(file, MediaClass::Image)
    }

    fn unchanged(file: SourceFile, class: MediaClass) -> PreparedFile {
        let extension = extension_from_filename(&file.name)
            .or_else(|| extension_for_mime(&file.content_type).map(String::from))
            .unwrap_or_else(|| "bin".to_string());
        PreparedFile {
            original_name: file.name,
            class,
            content_type: file.content_type,
            extension,
            data: file.data,
            compressed: false,
        }
    }
}
