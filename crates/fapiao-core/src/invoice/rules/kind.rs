//! Invoice type from the printed title.

use super::patterns::INVOICE_KIND;
use super::{ExtractionContext, FieldExtractor};
use crate::invoice::diagnostics::Diagnostics;
use crate::invoice::Result;
use crate::models::record::{Field, InvoiceKind};

/// Scans the layout text for a known title. Never fails: a page without
/// one resolves to [`InvoiceKind::Unrecognized`].
#[derive(Debug, Default, Clone, Copy)]
pub struct KindExtractor;

impl FieldExtractor for KindExtractor {
    type Output = InvoiceKind;

    fn field(&self) -> Field {
        Field::Kind
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, _diagnostics: &mut Diagnostics) -> Result<InvoiceKind> {
        let kind = ctx
            .layout_texts
            .iter()
            .find_map(|text| INVOICE_KIND.captures(text))
            .map(|caps| InvoiceKind::from_label(&caps[1]))
            .unwrap_or(InvoiceKind::Unrecognized);
        Ok(kind)
    }
}
