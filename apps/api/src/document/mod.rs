//! Document intake: validates the declared content type of an upload and
//! flattens a paginated PDF into one linear text blob.

pub mod extractor;
pub mod handlers;

use thiserror::Error;

pub use extractor::extract_document_text_blocking;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Declared content type is not a paginated document. Raised before parsing.
    #[error("unsupported content type '{0}'")]
    UnsupportedFormat(String),

    /// The document was accepted but a page could not be read.
    #[error("{0}")]
    Extraction(String),
}

/// Checks the declared content type (parameters such as `; charset=` ignored).
/// The payload itself is never sniffed.
pub fn ensure_pdf(content_type: Option<&str>) -> Result<(), DocumentError> {
    let declared = content_type.unwrap_or_default();
    let essence = declared.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(DocumentError::UnsupportedFormat(declared.to_string()))
    }
}
