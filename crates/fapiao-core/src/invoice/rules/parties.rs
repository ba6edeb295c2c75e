//! Buyer and seller names and tax IDs.

use regex::Regex;

use super::patterns::{PARTY_NAME, PARTY_TAX_ID};
use super::{ExtractionContext, FieldExtractor};
use crate::error::ExtractionError;
use crate::invoice::diagnostics::Diagnostics;
use crate::invoice::ordering::order_parties;
use crate::invoice::Result;
use crate::models::record::{Field, PartyInfo};

/// Captures the two 名称 and two 识别号 values, validates all four and
/// orders them by column.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartyExtractor;

fn capture_pair(pattern: &Regex, text: &str, label: &'static str) -> Result<[String; 2]> {
    let found: Vec<String> = pattern
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();
    <[String; 2]>::try_from(found).map_err(|found| ExtractionError::CountMismatch {
        field: Field::Parties,
        label,
        expected: 2,
        found: found.len(),
    })
}

impl FieldExtractor for PartyExtractor {
    type Output = PartyInfo;

    fn field(&self) -> Field {
        Field::Parties
    }

    fn extract(&self, ctx: &ExtractionContext<'_>, diagnostics: &mut Diagnostics) -> Result<PartyInfo> {
        let text = ctx.recognized_lines();
        let [name1, name2] = capture_pair(&PARTY_NAME, &text, "名称")?;
        let [tax_id1, tax_id2] = capture_pair(&PARTY_TAX_ID, &text, "纳税人识别号")?;

        let values = [
            ctx.validate(&name1, Field::Parties, diagnostics)?,
            ctx.validate(&tax_id1, Field::Parties, diagnostics)?,
            ctx.validate(&name2, Field::Parties, diagnostics)?,
            ctx.validate(&tax_id2, Field::Parties, diagnostics)?,
        ];

        order_parties(values, ctx.layout, ctx.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::testing::Fixture;
    use crate::pdf::{BoundingBox, TextBlock};
    use pretty_assertions::assert_eq;

    const RECOGNIZED: &[&str] = &[
        "名称：乙方有限公司",
        "名 称：甲方有限公司",
        "纳税人识别号：9222BBBB",
        "纳税人识别号：9111AAAA",
    ];

    fn layout() -> Vec<TextBlock> {
        let block = |text: &str, x0: f32, y0: f32| {
            TextBlock::new(text, BoundingBox::new(x0, y0, x0 + 200.0, y0 + 12.0))
        };
        vec![
            block("名称：甲方有限公司", 20.0, 100.0),
            block("名称：乙方有限公司", 320.0, 100.0),
            block("纳税人识别号：9111AAAA", 20.0, 120.0),
            block("纳税人识别号：9222BBBB", 320.0, 120.0),
        ]
    }

    #[test]
    fn test_extracts_and_orders() {
        let fixture = Fixture::new(RECOGNIZED, layout());
        let mut diagnostics = Diagnostics::new();

        let parties = PartyExtractor.extract(&fixture.ctx(), &mut diagnostics).unwrap();

        assert_eq!(
            parties,
            PartyInfo {
                buyer_name: "甲方有限公司".into(),
                buyer_tax_id: "9111AAAA".into(),
                seller_name: "乙方有限公司".into(),
                seller_tax_id: "9222BBBB".into(),
            }
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_requires_exactly_two_names() {
        let recognized = ["名称：甲方有限公司", "纳税人识别号：9111AAAA", "纳税人识别号：9222BBBB"];
        let fixture = Fixture::new(&recognized, layout());

        let result = PartyExtractor.extract(&fixture.ctx(), &mut Diagnostics::new());

        assert_eq!(
            result,
            Err(ExtractionError::CountMismatch {
                field: Field::Parties,
                label: "名称",
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_three_tax_ids_rejected() {
        let mut recognized = RECOGNIZED.to_vec();
        recognized.push("识别号：9333CCCC");
        let fixture = Fixture::new(&recognized, layout());

        let result = PartyExtractor.extract(&fixture.ctx(), &mut Diagnostics::new());

        assert!(matches!(result, Err(ExtractionError::CountMismatch { found: 3, .. })));
    }

    #[test]
    fn test_unvalidated_candidate_fails() {
        let mut blocks = layout();
        blocks.pop();
        let fixture = Fixture::new(RECOGNIZED, blocks);

        let result = PartyExtractor.extract(&fixture.ctx(), &mut Diagnostics::new());

        assert!(matches!(result, Err(ExtractionError::NotValidated { .. })));
    }
}
