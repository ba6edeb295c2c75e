//! Invoice field extraction.

pub mod diagnostics;
pub mod normalize;
pub mod orchestrator;
pub mod ordering;
pub mod rules;
pub mod validator;
pub mod zones;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use orchestrator::{ExtractorSet, ProcessedDocument, RetryOrchestrator};
pub use rules::{ExtractionContext, FieldExtractor};
pub use validator::FieldValidator;

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
