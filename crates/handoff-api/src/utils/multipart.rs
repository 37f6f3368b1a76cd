//! Multipart form parsing for the upload routes

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use handoff_core::AppError;
use handoff_processing::SourceFile;

/// Collect every `file` (or `files`) field of the form, in order.
///
/// Stops reading as soon as more than `max_files` files are seen.
pub async fn extract_source_files(
    mut multipart: Multipart,
    max_files: usize,
) -> Result<Vec<SourceFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default();
        if field_name != "file" && field_name != "files" {
            continue;
        }

        if files.len() == max_files {
            return Err(AppError::InvalidInput(format!(
                "Too many files (maximum {} per upload)",
                max_files
            )));
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        files.push(SourceFile::new(filename, content_type, data));
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput(
            "No file provided; send one or more fields named 'file'".to_string(),
        ));
    }
    Ok(files)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", err.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", err.body_text()))
    }
}
