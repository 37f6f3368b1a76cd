//! Ephemeral per-run file types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

/// Broad media class, decided from the declared MIME type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Image,
    Video,
}

impl MediaClass {
    /// `image/*` and `video/*` are accepted; everything else is not media.
    pub fn classify(content_type: &str) -> Option<Self> {
        let normalized = normalize_mime_type(content_type);
        if normalized.starts_with("image/") {
            Some(MediaClass::Image)
        } else if normalized.starts_with("video/") {
            Some(MediaClass::Video)
        } else {
            None
        }
    }

    /// Top-level storage folder for this class.
    pub fn folder(self) -> &'static str {
        match self {
            MediaClass::Image => "images",
            MediaClass::Video => "videos",
        }
    }
}

/// A file as selected by the user, before any processing.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// Declared MIME type, as sent by the client
    pub content_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: sanitize_filename(&name.into()),
            content_type: normalize_mime_type(&content_type.into()),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A file ready to be written to storage.
#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub original_name: String,
    pub class: MediaClass,
    pub content_type: String,
    pub extension: String,
    pub data: Bytes,
    /// False when the original bytes are uploaded unchanged
    pub compressed: bool,
}

/// A file that reached durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedAsset {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Strip parameters and lowercase a MIME type (`Image/JPEG; q=1` -> `image/jpeg`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Keep only the final path component of a client-supplied filename.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return "file".to_string();
    }
    base.chars()
        .take(MAX)
        .map(|c| if c.is_control() { '_' } else { c })
        .collect()
}

/// Lowercase extension of a filename, if it has one.
pub fn extension_from_filename(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
}

/// Conventional extension for common media MIME types.
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    match normalize_mime_type(content_type).as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        "image/avif" => Some("avif"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        "video/x-matroska" => Some("mkv"),
        "video/x-m4v" => Some("m4v"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_mime_prefix() {
        assert_eq!(MediaClass::classify("image/jpeg"), Some(MediaClass::Image));
        assert_eq!(MediaClass::classify("Video/MP4"), Some(MediaClass::Video));
        assert_eq!(
            MediaClass::classify("image/png; charset=binary"),
            Some(MediaClass::Image)
        );
        assert_eq!(MediaClass::classify("application/pdf"), None);
        assert_eq!(MediaClass::classify(""), None);
    }

    #[test]
    fn sanitize_keeps_only_the_base_name() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\IMG_0001.JPG"), "IMG_0001.JPG");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("   "), "file");
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_from_filename("clip.MOV").as_deref(), Some("mov"));
        assert_eq!(extension_from_filename("noext"), None);
        assert_eq!(extension_for_mime("video/quicktime"), Some("mov"));
        assert_eq!(extension_for_mime("application/octet-stream"), None);
    }
}
