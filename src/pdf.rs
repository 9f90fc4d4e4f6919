//! PDF upload validation and text extraction.
//!
//! Uses lopdf for structure (page count, encryption) and pdf-extract for
//! text. Both are blocking; async callers go through
//! [`extract_pdf_text_async`].

use lopdf::Document;
use thiserror::Error;
use tracing::{debug, warn};

/// Magic bytes every PDF starts with.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Errors validating or reading a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Not a PDF file{}", .0.as_deref().map(|m| format!(" (detected {})", m)).unwrap_or_default())]
    NotPdf(Option<String>),

    #[error("Encrypted PDFs are not supported")]
    Encrypted,

    #[error("PDF is password protected")]
    PasswordProtected,

    #[error("PDF is corrupted or unreadable: {0}")]
    Corrupted(String),

    #[error("PDF contains no extractable text")]
    Empty,
}

/// Text pulled from a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub full_text: String,
    pub page_count: usize,
}

/// Check an upload before doing any parsing.
pub fn validate_upload(bytes: &[u8], max_bytes: usize) -> Result<(), PdfError> {
    if bytes.len() > max_bytes {
        return Err(PdfError::TooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    if !bytes.starts_with(PDF_SIGNATURE) {
        let detected = infer::get(bytes).map(|t| t.mime_type().to_string());
        return Err(PdfError::NotPdf(detected));
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.mime_type() != "application/pdf" {
            return Err(PdfError::NotPdf(Some(kind.mime_type().to_string())));
        }
    }

    if contains(bytes, b"/Encrypt") {
        return Err(PdfError::Encrypted);
    }

    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Read page count and text from PDF bytes.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<PdfText, PdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| match e {
        lopdf::Error::Decryption(_) => PdfError::PasswordProtected,
        other => PdfError::Corrupted(other.to_string()),
    })?;
    if doc.is_encrypted() {
        return Err(PdfError::PasswordProtected);
    }
    let page_count = doc.get_pages().len();

    let full_text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfError::Corrupted(e.to_string()))?;

    if full_text.trim().is_empty() {
        return Err(PdfError::Empty);
    }

    debug!("PDF: {} pages, {} chars of text", page_count, full_text.len());
    Ok(PdfText {
        full_text,
        page_count: page_count.max(1),
    })
}

/// Run [`extract_pdf_text`] on the blocking pool.
///
/// pdf-extract panics on some malformed inputs; a panicked task is
/// reported as a corrupted document.
pub async fn extract_pdf_text_async(bytes: Vec<u8>) -> Result<PdfText, PdfError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| {
            warn!("PDF extraction task failed: {}", e);
            PdfError::Corrupted(format!("Task join error: {}", e))
        })?
}
