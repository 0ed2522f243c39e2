//! Axum route handler for resume upload.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::document::{ensure_pdf, extract_document_text_blocking};
use crate::errors::AppError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub document_text: String,
    pub page_count: usize,
    pub character_count: usize,
}

/// POST /api/v1/documents
///
/// Multipart upload with the resume in a `file` part declared as
/// `application/pdf`. The extracted text replaces the session's document.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().unwrap_or("upload").to_string();
        // Reject on the declared type before reading the body.
        ensure_pdf(content_type.as_deref())?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        let extracted = extract_document_text_blocking(content_type, bytes).await?;

        info!(
            "Uploaded '{}': {} page(s), {} chars",
            file_name,
            extracted.page_count,
            extracted.text.len()
        );
        state.session.set_document_text(extracted.text.clone());

        return Ok(Json(UploadResponse {
            character_count: extracted.text.chars().count(),
            document_text: extracted.text,
            page_count: extracted.page_count,
        }));
    }

    Err(AppError::Validation(format!(
        "multipart body must contain a '{FILE_FIELD}' part"
    )))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("invalid multipart body: {}", err.body_text()))
    }
}
