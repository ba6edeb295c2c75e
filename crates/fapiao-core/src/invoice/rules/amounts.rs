//! Total amount (价税合计).

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use super::patterns::LOWERCASE_AMOUNT;
use super::{ExtractionContext, FieldExtractor};
use crate::error::ExtractionError;
use crate::invoice::diagnostics::{DiagnosticKind, Diagnostics};
use crate::invoice::zones::resolve_total_amount;
use crate::invoice::Result;
use crate::models::record::Field;

/// Parse an amount such as `1,234.56`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&s.trim().replace(',', "")).ok()
}

/// Reads the total from the 价税合计 row of the layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZoneAmountExtractor;

impl FieldExtractor for ZoneAmountExtractor {
    type Output = Decimal;

    fn field(&self) -> Field {
        Field::Amount
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<Decimal> {
        resolve_total_amount(ctx.layout, ctx.document, diagnostics)
    }
}

/// Reads the `(小写)` figure from the recognized text, validates it
/// against the layout and cross-checks it with the zone figure.
#[derive(Debug, Clone, Copy)]
pub struct OcrAmountExtractor {
    tolerance: Decimal,
}

impl OcrAmountExtractor {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }
}

impl Default for OcrAmountExtractor {
    fn default() -> Self {
        Self::new(Decimal::new(1, 2))
    }
}

impl FieldExtractor for OcrAmountExtractor {
    type Output = Decimal;

    fn field(&self) -> Field {
        Field::Amount
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<Decimal> {
        let field = Field::Amount;
        let text = ctx.recognized_joined();
        let caps = LOWERCASE_AMOUNT
            .captures(&text)
            .ok_or(ExtractionError::NotFound { field, label: "（小写）" })?;

        let validated = ctx.validate(&caps[1], field, diagnostics)?;
        let recognized = parse_amount(&validated).ok_or_else(|| ExtractionError::Parse {
            field,
            value: validated.clone(),
        })?;

        // Zone failures are not this strategy's concern; only compare when
        // the zone yields a figure.
        let mut scratch = Diagnostics::new();
        if let Ok(zone) = resolve_total_amount(ctx.layout, ctx.document, &mut scratch) {
            if (recognized - zone).abs() > self.tolerance {
                warn!(
                    document = ctx.document,
                    %recognized,
                    %zone,
                    "recognized total differs from layout total"
                );
                diagnostics.push(
                    ctx.document,
                    Some(field),
                    DiagnosticKind::AmountDiscrepancy { recognized, zone },
                );
            }
        }

        Ok(recognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::testing::Fixture;
    use crate::pdf::{BoundingBox, TextBlock};
    use pretty_assertions::assert_eq;

    fn row(texts: &[(&str, f32)]) -> Vec<TextBlock> {
        texts
            .iter()
            .map(|(text, x0)| TextBlock::new(*text, BoundingBox::new(*x0, 300.0, x0 + 100.0, 315.0)))
            .collect()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("0.00"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("12,345,678.90"), Some(Decimal::new(1234567890, 2)));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_zone_short_circuit_needs_no_recognition() {
        let fixture = Fixture::new(&[], row(&[("价税合计 ¥1,234.56", 20.0)]));
        let amount = ZoneAmountExtractor
            .extract(&fixture.ctx(), &mut Diagnostics::new())
            .unwrap();
        assert_eq!(amount, Decimal::new(123456, 2));
    }

    #[test]
    fn test_ocr_amount_agrees_with_zone() {
        let layout = row(&[("价税合计（大写）", 20.0), ("（小写）¥1,130.00", 400.0)]);
        let fixture = Fixture::new(&["价税合计", "(小写)¥1,130.00"], layout);
        let mut diagnostics = Diagnostics::new();

        let amount = OcrAmountExtractor::default()
            .extract(&fixture.ctx(), &mut diagnostics)
            .unwrap();

        assert_eq!(amount, Decimal::new(113000, 2));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_ocr_amount_discrepancy_is_reported() {
        // The recognized figure is printed elsewhere on the page; the zone reads 1,180.00.
        let layout = vec![
            TextBlock::new("价税合计 ¥1,180.00", BoundingBox::new(20.0, 300.0, 200.0, 315.0)),
            TextBlock::new("¥1,130.00", BoundingBox::new(20.0, 500.0, 100.0, 515.0)),
        ];
        let fixture = Fixture::new(&["（小写）¥1,130.00"], layout);
        let mut diagnostics = Diagnostics::new();

        let amount = OcrAmountExtractor::default()
            .extract(&fixture.ctx(), &mut diagnostics)
            .unwrap();

        assert_eq!(amount, Decimal::new(113000, 2));
        assert_eq!(diagnostics.warnings().count(), 1);
        assert!(matches!(
            diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::AmountDiscrepancy { .. }
        ));
    }

    #[test]
    fn test_ocr_amount_without_label() {
        let fixture = Fixture::new(&["¥1,130.00"], row(&[("¥1,130.00", 20.0)]));
        let result = OcrAmountExtractor::default().extract(&fixture.ctx(), &mut Diagnostics::new());
        assert!(matches!(result, Err(ExtractionError::NotFound { .. })));
    }
}
