//! Remarks box (备注).

use super::{ExtractionContext, FieldExtractor};
use crate::invoice::diagnostics::Diagnostics;
use crate::invoice::zones::resolve_remarks;
use crate::invoice::Result;
use crate::models::record::Field;

/// Reads the remarks box of the layout. An empty box is a valid value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemarksExtractor;

impl FieldExtractor for RemarksExtractor {
    type Output = String;

    fn field(&self) -> Field {
        Field::Remarks
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<String> {
        resolve_remarks(ctx.layout, ctx.document, diagnostics)
    }
}
