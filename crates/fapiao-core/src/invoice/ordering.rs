//! Buyer/seller disambiguation by column position.
//!
//! The buyer's column is printed left of the seller's, so whichever of two
//! captured names (or tax IDs) sits further left belongs to the buyer.
//! Names and tax IDs are ordered independently.

use tracing::debug;

use super::Result;
use crate::error::ExtractionError;
use crate::models::record::PartyInfo;
use crate::pdf::TextBlock;

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Left edge of the last block containing `value`, whitespace ignored.
pub fn left_edge(value: &str, blocks: &[TextBlock]) -> Option<f32> {
    let needle = compact(value);
    if needle.is_empty() {
        return None;
    }
    blocks
        .iter()
        .rev()
        .find(|block| compact(&block.text).contains(&needle))
        .map(|block| block.bbox.x0)
}

/// Order `[name1, tax_id1, name2, tax_id2]` into buyer and seller.
pub fn order_parties(values: [String; 4], blocks: &[TextBlock], document: &str) -> Result<PartyInfo> {
    let mut xs = [0.0f32; 4];
    let mut missing = Vec::new();
    for (x, value) in xs.iter_mut().zip(&values) {
        match left_edge(value, blocks) {
            Some(edge) => *x = edge,
            None => missing.push(value.clone()),
        }
    }
    if !missing.is_empty() {
        debug!(document, ?missing, "party values not found in layout");
        return Err(ExtractionError::Unordered { missing });
    }

    let [mut buyer_name, mut buyer_tax_id, mut seller_name, mut seller_tax_id] = values;
    if xs[0] > xs[2] {
        std::mem::swap(&mut buyer_name, &mut seller_name);
    }
    if xs[1] > xs[3] {
        std::mem::swap(&mut buyer_tax_id, &mut seller_tax_id);
    }

    Ok(PartyInfo {
        buyer_name,
        buyer_tax_id,
        seller_name,
        seller_tax_id,
    })
}
