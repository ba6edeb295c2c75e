//! Field extractors for VAT invoices.
//!
//! Each extractor is independent and retryable: it sees one attempt's
//! recognized text plus the document's cached layout, and either produces
//! a value or an [`ExtractionError`](crate::error::ExtractionError) that
//! leaves its slot unresolved until the next attempt.

pub mod amounts;
pub mod kind;
pub mod number;
pub mod parties;
pub mod patterns;
pub mod remarks;

pub use amounts::{parse_amount, OcrAmountExtractor, ZoneAmountExtractor};
pub use kind::KindExtractor;
pub use number::NumberExtractor;
pub use parties::PartyExtractor;
pub use remarks::RemarksExtractor;

use super::diagnostics::Diagnostics;
use super::validator::FieldValidator;
use super::Result;
use crate::models::record::Field;
use crate::pdf::TextBlock;

/// Inputs visible to an extractor during one attempt.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// Absolute path of the document, used as its id in diagnostics.
    pub document: &'a str,
    /// Strings from this attempt's recognition pass.
    pub recognized: &'a [String],
    /// Layout blocks of the analyzed page, in reading order.
    pub layout: &'a [TextBlock],
    /// Texts of `layout`, same order.
    pub layout_texts: &'a [String],
    pub validator: &'a FieldValidator,
}

impl<'a> ExtractionContext<'a> {
    /// Recognized strings glued together without separators.
    pub fn recognized_joined(&self) -> String {
        self.recognized.concat()
    }

    /// Recognized strings one per line.
    pub fn recognized_lines(&self) -> String {
        self.recognized.join("\n")
    }

    /// Validate an OCR candidate against this document's layout text.
    pub fn validate(&self, candidate: &str, field: Field, diagnostics: &mut Diagnostics) -> Result<String> {
        self.validator
            .validate(candidate, self.layout_texts, field, self.document, diagnostics)
    }
}

/// Trait for field extractors.
pub trait FieldExtractor: Send + Sync {
    /// The type of value this extractor produces.
    type Output;

    /// The slot this extractor fills.
    fn field(&self) -> Field;

    /// Extract the field for one attempt.
    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<Self::Output>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::pdf::BoundingBox;

    /// Owns everything an [`ExtractionContext`] borrows.
    pub struct Fixture {
        pub recognized: Vec<String>,
        pub layout: Vec<TextBlock>,
        pub layout_texts: Vec<String>,
        pub validator: FieldValidator,
    }

    impl Fixture {
        pub fn new(recognized: &[&str], layout: Vec<TextBlock>) -> Self {
            let layout_texts = layout.iter().map(|b| b.text.clone()).collect();
            Self {
                recognized: recognized.iter().map(|s| s.to_string()).collect(),
                layout,
                layout_texts,
                validator: FieldValidator::new(),
            }
        }

        /// Layout of single-row blocks stacked top to bottom.
        pub fn stacked(recognized: &[&str], texts: &[&str]) -> Self {
            let layout = texts
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let y = 20.0 * i as f32;
                    TextBlock::new(*text, BoundingBox::new(10.0, y, 300.0, y + 12.0))
                })
                .collect();
            Self::new(recognized, layout)
        }

        pub fn ctx(&self) -> ExtractionContext<'_> {
            ExtractionContext {
                document: "/invoices/test.pdf",
                recognized: &self.recognized,
                layout: &self.layout,
                layout_texts: &self.layout_texts,
                validator: &self.validator,
            }
        }
    }
}
