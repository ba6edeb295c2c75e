//! Geometric zones anchored to printed labels.
//!
//! The invoice template is fixed: the total-amount row carries the
//! 价税合计 label, and the remarks box sits below that row, above the
//! 开票人 (issuer) line and to the right of the 备注 label.

use rust_decimal::Decimal;
use tracing::debug;

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::rules::amounts::parse_amount;
use super::rules::patterns::CURRENCY_AMOUNT;
use super::Result;
use crate::error::ExtractionError;
use crate::models::record::Field;
use crate::pdf::TextBlock;

/// Label of the combined tax-and-price total row.
pub const TOTAL_LABEL: &str = "价税合计";

/// Label of the issuer signature line.
pub const ISSUER_LABEL: &str = "开票人";

/// The remarks label, printed either whole or as a lone first character
/// when the two characters are stacked vertically.
pub const REMARKS_LABELS: &[&str] = &["备", "备注"];

/// A landmark text used to position a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Any block whose text contains the needle.
    Contains(&'static str),
    /// A block whose whole text, line breaks removed, equals one of the labels.
    Label(&'static [&'static str]),
}

impl Anchor {
    pub const TOTAL: Anchor = Anchor::Contains(TOTAL_LABEL);
    pub const ISSUER: Anchor = Anchor::Contains(ISSUER_LABEL);
    pub const REMARKS: Anchor = Anchor::Label(REMARKS_LABELS);

    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        match self {
            Anchor::Contains(needle) => text.contains(needle),
            Anchor::Label(labels) => {
                let joined: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
                labels.iter().any(|label| text == *label || joined == *label)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::Contains(needle) => needle,
            Anchor::Label(labels) => labels.last().copied().unwrap_or_default(),
        }
    }
}

/// Vertical extent of a zone, top above bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalBand {
    pub top: f32,
    pub bottom: f32,
}

/// Last block in reading order matching the anchor.
pub fn find_anchor(blocks: &[TextBlock], anchor: Anchor) -> Option<&TextBlock> {
    blocks.iter().rev().find(|block| anchor.matches(&block.text))
}

/// Band from the bottom edge of `start` to the top edge of `end`.
pub fn zone_between(blocks: &[TextBlock], start: Anchor, end: Anchor) -> Option<VerticalBand> {
    let top = find_anchor(blocks, start)?.bbox.y1;
    let bottom = find_anchor(blocks, end)?.bbox.y0;
    Some(VerticalBand { top, bottom })
}

/// Right edge of the anchor, the left bound of a zone to its right.
pub fn zone_right_of(blocks: &[TextBlock], anchor: Anchor) -> Option<f32> {
    find_anchor(blocks, anchor).map(|block| block.bbox.x1)
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn dump_blocks(document: &str, field: Field, blocks: &[TextBlock]) {
    debug!(document, %field, "layout blocks ({}):", blocks.len());
    for block in blocks {
        debug!(
            "  {:?} ({:.1}, {:.1}, {:.1}, {:.1})",
            block.text, block.bbox.x0, block.bbox.y0, block.bbox.x1, block.bbox.y1
        );
    }
}

/// Read the total amount from the 价税合计 row.
///
/// An amount printed inside the anchor block itself wins. Otherwise every
/// block overlapping the anchor's row is concatenated and must contain
/// exactly one `¥<amount>`.
pub fn resolve_total_amount(
    blocks: &[TextBlock],
    document: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Decimal> {
    let field = Field::Amount;
    let mut band = None;

    for block in blocks {
        let text = compact(&block.text);
        if !Anchor::TOTAL.matches(&text) {
            continue;
        }
        if let Some(caps) = CURRENCY_AMOUNT.captures(&text) {
            debug!(document, "total amount read from anchor block");
            return parse_amount(&caps[1]).ok_or_else(|| ExtractionError::Parse {
                field,
                value: caps[1].to_string(),
            });
        }
        band = Some(VerticalBand {
            top: block.bbox.y0,
            bottom: block.bbox.y1,
        });
    }

    let Some(band) = band else {
        dump_blocks(document, field, blocks);
        diagnostics.push(
            document,
            Some(field),
            DiagnosticKind::AnchorsMissing {
                missing: vec![TOTAL_LABEL.to_string()],
            },
        );
        return Err(ExtractionError::AnchorsMissing {
            field,
            missing: vec![TOTAL_LABEL],
        });
    };

    let strip: String = blocks
        .iter()
        .filter(|block| block.bbox.overlaps_rows(band.top, band.bottom))
        .map(|block| compact(&block.text))
        .collect();

    let candidates: Vec<String> = CURRENCY_AMOUNT
        .captures_iter(&strip)
        .map(|caps| caps[1].to_string())
        .collect();

    match candidates.as_slice() {
        [amount] => parse_amount(amount).ok_or_else(|| ExtractionError::Parse {
            field,
            value: amount.clone(),
        }),
        [] => {
            debug!(document, strip = %strip, "no amount in total row");
            diagnostics.push(document, Some(field), DiagnosticKind::AmountNotFound);
            Err(ExtractionError::ZoneEmpty { field })
        }
        _ => {
            debug!(document, ?candidates, "several amounts in total row");
            let count = candidates.len();
            diagnostics.push(
                document,
                Some(field),
                DiagnosticKind::ZoneAmbiguous { candidates },
            );
            Err(ExtractionError::ZoneAmbiguous { field, count })
        }
    }
}

/// Concatenate the blocks inside the remarks box.
///
/// All three anchors present and nothing inside the box yields an empty
/// string, which is a valid value.
pub fn resolve_remarks(
    blocks: &[TextBlock],
    document: &str,
    diagnostics: &mut Diagnostics,
) -> Result<String> {
    let field = Field::Remarks;
    let missing: Vec<&'static str> = [Anchor::TOTAL, Anchor::ISSUER, Anchor::REMARKS]
        .into_iter()
        .filter(|anchor| find_anchor(blocks, *anchor).is_none())
        .map(|anchor| anchor.name())
        .collect();

    let (Some(band), Some(left)) = (
        zone_between(blocks, Anchor::TOTAL, Anchor::ISSUER),
        zone_right_of(blocks, Anchor::REMARKS),
    ) else {
        dump_blocks(document, field, blocks);
        diagnostics.push(
            document,
            Some(field),
            DiagnosticKind::AnchorsMissing {
                missing: missing.iter().map(|name| name.to_string()).collect(),
            },
        );
        return Err(ExtractionError::AnchorsMissing { field, missing });
    };

    let remarks: String = blocks
        .iter()
        .filter(|block| {
            block.bbox.y0 > band.top && block.bbox.y1 < band.bottom && block.bbox.x0 > left
        })
        .map(|block| block.text.replace(['\n', '\r'], ""))
        .collect();

    Ok(remarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::BoundingBox;
    use pretty_assertions::assert_eq;

    const DOC: &str = "/invoices/a.pdf";

    fn block(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> TextBlock {
        TextBlock::new(text, BoundingBox::new(x0, y0, x1, y1))
    }

    fn invoice_footer() -> Vec<TextBlock> {
        vec![
            block("价税合计（大写）", 20.0, 300.0, 100.0, 315.0),
            block("壹仟贰佰叁拾肆圆伍角陆分", 120.0, 301.0, 300.0, 314.0),
            block("（小写）¥1,234.56", 400.0, 302.0, 520.0, 316.0),
            block("备", 20.0, 330.0, 35.0, 345.0),
            block("合同编号：BS2024AB17", 60.0, 332.0, 300.0, 344.0),
            block("项目二期款", 60.0, 350.0, 200.0, 362.0),
            block("收款人：张三", 20.0, 400.0, 120.0, 412.0),
            block("开票人：李四", 300.0, 400.0, 400.0, 412.0),
        ]
    }

    #[test]
    fn test_anchor_matching() {
        assert!(Anchor::TOTAL.matches("  价税合计（大写） "));
        assert!(Anchor::REMARKS.matches("备"));
        assert!(Anchor::REMARKS.matches("备\n注"));
        assert!(!Anchor::REMARKS.matches("备注栏"));
        assert_eq!(Anchor::REMARKS.name(), "备注");
    }

    #[test]
    fn test_zone_between_and_right_of() {
        let blocks = invoice_footer();
        assert_eq!(
            zone_between(&blocks, Anchor::TOTAL, Anchor::ISSUER),
            Some(VerticalBand { top: 315.0, bottom: 400.0 })
        );
        assert_eq!(zone_right_of(&blocks, Anchor::REMARKS), Some(35.0));
        assert_eq!(zone_right_of(&blocks[..3], Anchor::REMARKS), None);
    }

    #[test]
    fn test_total_amount_from_anchor_block() {
        // The row also holds a second amount; the anchor block takes precedence.
        let blocks = vec![
            block("价税合计 ¥1,234.56", 20.0, 300.0, 200.0, 315.0),
            block("¥99.00", 400.0, 300.0, 450.0, 315.0),
        ];
        let mut diagnostics = Diagnostics::new();

        let amount = resolve_total_amount(&blocks, DOC, &mut diagnostics).unwrap();

        assert_eq!(amount, Decimal::new(123456, 2));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_total_amount_from_row() {
        let mut diagnostics = Diagnostics::new();
        let amount = resolve_total_amount(&invoice_footer(), DOC, &mut diagnostics).unwrap();
        assert_eq!(amount, Decimal::new(123456, 2));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_total_amount_ignores_other_rows() {
        let blocks = vec![
            block("合计", 20.0, 250.0, 60.0, 265.0),
            block("¥1,000.00", 400.0, 250.0, 480.0, 265.0),
            block("价税合计（大写）", 20.0, 300.0, 100.0, 315.0),
            block("（小写）￥1,130.00", 400.0, 300.0, 520.0, 315.0),
        ];
        let mut diagnostics = Diagnostics::new();
        let amount = resolve_total_amount(&blocks, DOC, &mut diagnostics).unwrap();
        assert_eq!(amount, Decimal::new(113000, 2));
    }

    #[test]
    fn test_total_amount_ambiguous_row() {
        let blocks = vec![
            block("价税合计（大写）", 20.0, 300.0, 100.0, 315.0),
            block("¥1,234.56", 300.0, 302.0, 380.0, 314.0),
            block("¥99.00", 400.0, 302.0, 450.0, 314.0),
        ];
        let mut diagnostics = Diagnostics::new();

        let result = resolve_total_amount(&blocks, DOC, &mut diagnostics);

        assert_eq!(
            result,
            Err(ExtractionError::ZoneAmbiguous { field: Field::Amount, count: 2 })
        );
        assert_eq!(diagnostics.errors().count(), 1);
        assert!(matches!(
            &diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::ZoneAmbiguous { candidates } if candidates.len() == 2
        ));
    }

    #[test]
    fn test_total_amount_missing_anchor() {
        let blocks = vec![block("¥1,234.56", 300.0, 302.0, 380.0, 314.0)];
        let mut diagnostics = Diagnostics::new();

        let result = resolve_total_amount(&blocks, DOC, &mut diagnostics);

        assert!(matches!(result, Err(ExtractionError::AnchorsMissing { .. })));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_total_amount_empty_row() {
        let blocks = vec![block("价税合计（大写）", 20.0, 300.0, 100.0, 315.0)];
        let mut diagnostics = Diagnostics::new();

        let result = resolve_total_amount(&blocks, DOC, &mut diagnostics);

        assert_eq!(
            result,
            Err(ExtractionError::ZoneEmpty { field: Field::Amount })
        );
        assert!(matches!(
            diagnostics.iter().next().unwrap().kind,
            DiagnosticKind::AmountNotFound
        ));
    }

    #[test]
    fn test_remarks() {
        let mut diagnostics = Diagnostics::new();
        let remarks = resolve_remarks(&invoice_footer(), DOC, &mut diagnostics).unwrap();
        assert_eq!(remarks, "合同编号：BS2024AB17项目二期款");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_remarks_keeps_split_line_in_order() {
        let mut blocks = invoice_footer();
        blocks.retain(|b| !b.text.starts_with("合同编号"));
        blocks.push(block("BS2024AB17", 121.0, 332.0, 200.0, 343.6));
        blocks.push(block("合同编号：", 60.0, 332.4, 118.0, 344.0));
        crate::pdf::sort_by_reading_order(&mut blocks);
        let mut diagnostics = Diagnostics::new();

        let remarks = resolve_remarks(&blocks, DOC, &mut diagnostics).unwrap();

        assert_eq!(remarks, "合同编号：BS2024AB17项目二期款");
        let caps = crate::invoice::rules::patterns::CONTRACT_NUMBER
            .captures(&remarks)
            .unwrap();
        assert_eq!(&caps[1], "2024AB17");
    }

    #[test]
    fn test_remarks_strips_line_breaks() {
        let mut blocks = invoice_footer();
        blocks[4].text = "合同编号：\nBS2024AB17".to_string();
        let mut diagnostics = Diagnostics::new();
        let remarks = resolve_remarks(&blocks, DOC, &mut diagnostics).unwrap();
        assert_eq!(remarks, "合同编号：BS2024AB17项目二期款");
    }

    #[test]
    fn test_empty_remarks_is_valid() {
        let blocks: Vec<TextBlock> = invoice_footer()
            .into_iter()
            .filter(|b| !b.text.contains("合同") && !b.text.contains("项目"))
            .collect();
        let mut diagnostics = Diagnostics::new();

        assert_eq!(resolve_remarks(&blocks, DOC, &mut diagnostics), Ok(String::new()));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_remarks_missing_anchor() {
        let blocks: Vec<TextBlock> = invoice_footer()
            .into_iter()
            .filter(|b| !b.text.starts_with("开票人"))
            .collect();
        let mut diagnostics = Diagnostics::new();

        let result = resolve_remarks(&blocks, DOC, &mut diagnostics);

        assert_eq!(
            result,
            Err(ExtractionError::AnchorsMissing {
                field: Field::Remarks,
                missing: vec![ISSUER_LABEL],
            })
        );
        assert_eq!(diagnostics.errors().count(), 1);
    }
}
