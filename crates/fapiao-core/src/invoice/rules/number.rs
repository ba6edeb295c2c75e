//! Invoice number.

use tracing::trace;

use super::patterns::INVOICE_NUMBER;
use super::{ExtractionContext, FieldExtractor};
use crate::error::ExtractionError;
use crate::invoice::diagnostics::Diagnostics;
use crate::invoice::Result;
use crate::models::record::Field;

/// Reads the number after 发票号码 in the recognized text and anchors it
/// to the layout text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberExtractor;

impl FieldExtractor for NumberExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::Number
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<String> {
        let text = ctx.recognized_joined();
        let caps = INVOICE_NUMBER.captures(&text).ok_or(ExtractionError::NotFound {
            field: Field::Number,
            label: "发票号码",
        })?;
        trace!(document = ctx.document, candidate = &caps[1], "invoice number candidate");
        ctx.validate(&caps[1], Field::Number, diagnostics)
    }
}
