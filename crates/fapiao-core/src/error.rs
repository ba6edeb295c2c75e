//! Error types for the fapiao-core library.

use thiserror::Error;

use crate::models::record::Field;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The pdfium library could not be bound.
    #[error("failed to bind pdfium: {0}")]
    Bind(String),

    /// Failed to open/parse the PDF file.
    #[error("failed to load PDF: {0}")]
    Load(String),

    /// Failed to extract positioned text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to render a page to an image.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Outcomes that leave a field unresolved for the current attempt.
///
/// None of these are fatal: the orchestrator keeps the slot empty and
/// retries it on the next recognition pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The labeled pattern was not present in the recognized text.
    #[error("{field}: {label} not found in recognized text")]
    NotFound { field: Field, label: &'static str },

    /// A candidate had neither an exact nor a close match in the layout text.
    #[error("{field}: candidate {candidate:?} not found in layout text")]
    NotValidated { field: Field, candidate: String },

    /// A pattern matched a different number of times than required.
    #[error("{field}: expected {expected} matches of {label}, found {found}")]
    CountMismatch {
        field: Field,
        label: &'static str,
        expected: usize,
        found: usize,
    },

    /// One or more zone anchors are absent from the layout.
    #[error("{field}: zone anchors missing: {missing:?}")]
    AnchorsMissing {
        field: Field,
        missing: Vec<&'static str>,
    },

    /// The zone held no candidate value.
    #[error("{field}: no value in zone")]
    ZoneEmpty { field: Field },

    /// The zone held several candidate values.
    #[error("{field}: {count} candidate values in zone")]
    ZoneAmbiguous { field: Field, count: usize },

    /// Buyer and seller columns could not be told apart.
    #[error("party order undetermined, not located in layout: {missing:?}")]
    Unordered { missing: Vec<String> },

    /// A matched amount could not be parsed as a decimal.
    #[error("{field}: failed to parse amount {value:?}")]
    Parse { field: Field, value: String },
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
