//! PDF composition on top of `lopdf`.
//!
//! Callers describe a document as a flat list of [`Block`]s; [`compose`] lays
//! them out on A4 pages with the standard Helvetica and Courier fonts and
//! returns the serialized file. [`info`] and [`extract_text`] read a produced
//! document back.

use thiserror::Error;

pub mod images;
pub mod layout;
pub mod reader;
pub mod text;
pub mod types;
pub mod writer;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Image error: {0}")]
    Image(String),
    #[error("PDF encoding error: {0}")]
    Encode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out and serialize a document.
///
/// Identical specs produce byte-identical output.
pub fn compose(spec: &DocumentSpec) -> Result<Vec<u8>, PdfError> {
    let pages = layout::layout(spec);
    writer::write(spec, &pages)
}

/// Get document metadata.
pub fn info(bytes: &[u8]) -> Result<DocumentMetadata, PdfError> {
    let doc = reader::LoadedDocument::load_bytes(bytes)?;
    let raw = doc.metadata();
    Ok(DocumentMetadata {
        title: raw.get("Title").cloned(),
        author: raw.get("Author").cloned(),
        page_count: doc.page_count(),
        creator: raw.get("Creator").cloned(),
        producer: raw.get("Producer").cloned(),
    })
}

/// Extract the plain text of every page.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    reader::LoadedDocument::load_bytes(bytes)?.text()
}
