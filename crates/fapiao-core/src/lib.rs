//! Core library for Chinese VAT invoice field extraction.
//!
//! This crate provides:
//! - Layout text blocks and page rendering through a document backend (pdfium)
//! - A recognition provider abstraction over an OCR engine (pure-onnx-ocr)
//! - Field extractors for invoice type, number, parties, total amount and remarks
//! - Cross-source validation of OCR candidates against layout text
//! - A bounded retry orchestrator producing one record per document

pub mod error;
pub mod models;
pub mod pdf;
pub mod ocr;
pub mod invoice;

pub use error::{FapiaoError, Result};
pub use rust_decimal::Decimal;
pub use models::config::FapiaoConfig;
pub use models::record::{DocumentRecord, Field, FieldResult, FieldSlot, InvoiceKind, PartyInfo, ProcessingState};
pub use pdf::{BoundingBox, DocumentBackend, TextBlock};
pub use ocr::RecognitionProvider;
pub use invoice::{
    Diagnostic, DiagnosticKind, Diagnostics, ExtractorSet, FieldValidator, ProcessedDocument,
    RetryOrchestrator, Severity,
};

#[cfg(feature = "native")]
pub use pdf::PdfiumBackend;

#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
