use crate::media::{MediaClass, SourceFile};

/// Per-file validation failures. Never fatal to the rest of a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Empty file")]
    EmptyFile,
}

/// Media file validator
///
/// Decides the media class of a file and enforces the size ceiling for it.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    image_max_size: usize,
    video_max_size: usize,
}

impl MediaValidator {
    pub fn new(image_max_size: usize, video_max_size: usize) -> Self {
        Self {
            image_max_size,
            video_max_size,
        }
    }

    pub fn video_max_size(&self) -> usize {
        self.video_max_size
    }

    /// Validate file size against a ceiling
    pub fn validate_file_size(&self, size: usize, max: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// Validate content type, returning the media class
    pub fn validate_content_type(&self, content_type: &str) -> Result<MediaClass, ValidationError> {
        MediaClass::classify(content_type).ok_or_else(|| ValidationError::UnsupportedType {
            content_type: content_type.to_string(),
        })
    }

    /// Validate all aspects of a file
    pub fn validate(&self, file: &SourceFile) -> Result<MediaClass, ValidationError> {
        let class = self.validate_content_type(&file.content_type)?;
        let max = match class {
            MediaClass::Image => self.image_max_size,
            MediaClass::Video => self.video_max_size,
        };
        self.validate_file_size(file.size(), max)?;
        Ok(class)
    }
}
