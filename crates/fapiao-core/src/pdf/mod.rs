//! PDF processing module.

#[cfg(feature = "native")]
mod pdfium;

#[cfg(feature = "native")]
pub use pdfium::PdfiumBackend;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Axis-aligned rectangle in page coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// True when the vertical extents share an interior point.
    pub fn overlaps_rows(&self, top: f32, bottom: f32) -> bool {
        self.y0 < bottom && self.y1 > top
    }

    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// True when both boxes sit on the same printed line: their vertical
    /// extents overlap by at least half of the shorter one, or their
    /// centres are within `ROW_CENTER_TOLERANCE` points.
    pub fn same_row(&self, other: &BoundingBox) -> bool {
        if (self.center_y() - other.center_y()).abs() <= ROW_CENTER_TOLERANCE {
            return true;
        }
        let overlap = self.y1.min(other.y1) - self.y0.max(other.y0);
        let shorter = (self.y1 - self.y0).min(other.y1 - other.y0);
        shorter > 0.0 && overlap >= shorter / 2.0
    }
}

/// A fragment of layout text and its bounding rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub bbox: BoundingBox,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// Maximum distance between vertical centres for two blocks to share a row.
const ROW_CENTER_TOLERANCE: f32 = 2.0;

/// Sort blocks top-to-bottom, then left-to-right within each printed row.
///
/// Segments of one line rarely share an exact `y0`, so blocks are first
/// grouped into rows and each row is then ordered by `x0`.
pub fn sort_by_reading_order(blocks: &mut [TextBlock]) {
    blocks.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    let mut start = 0;
    while start < blocks.len() {
        let head = blocks[start].bbox;
        let end = blocks[start + 1..]
            .iter()
            .position(|block| !head.same_row(&block.bbox))
            .map_or(blocks.len(), |offset| start + 1 + offset);
        blocks[start..end].sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
        start = end;
    }
}

/// Source of positioned layout text and rendered pages.
///
/// Pages are 0-indexed.
pub trait DocumentBackend {
    /// Get the number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Extract text blocks from a page in reading order.
    fn layout_blocks(&self, path: &Path, page: u32) -> Result<Vec<TextBlock>>;

    /// Render a page as an image at the specified DPI.
    fn render_page(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage>;
}

impl<T: DocumentBackend + ?Sized> DocumentBackend for &T {
    fn page_count(&self, path: &Path) -> Result<u32> {
        (**self).page_count(path)
    }

    fn layout_blocks(&self, path: &Path, page: u32) -> Result<Vec<TextBlock>> {
        (**self).layout_blocks(path, page)
    }

    fn render_page(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage> {
        (**self).render_page(path, page, dpi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_order() {
        let mut blocks = vec![
            TextBlock::new("c", BoundingBox::new(10.0, 50.0, 20.0, 60.0)),
            TextBlock::new("b", BoundingBox::new(80.0, 10.0, 90.0, 20.0)),
            TextBlock::new("a", BoundingBox::new(10.0, 10.0, 20.0, 20.0)),
        ];
        sort_by_reading_order(&mut blocks);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reading_order_groups_segments_of_one_line() {
        // pdfium splits a CJK label and its ASCII value into separate
        // segments whose tight boxes differ by a fraction of a point.
        let mut blocks = vec![
            TextBlock::new("项目二期款", BoundingBox::new(60.0, 350.0, 200.0, 362.0)),
            TextBlock::new("合同编号：", BoundingBox::new(60.0, 332.4, 118.0, 344.0)),
            TextBlock::new("BS2024AB17", BoundingBox::new(121.0, 332.0, 200.0, 343.6)),
            TextBlock::new("备", BoundingBox::new(20.0, 330.0, 35.0, 345.0)),
        ];
        sort_by_reading_order(&mut blocks);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["备", "合同编号：", "BS2024AB17", "项目二期款"]);
    }

    #[test]
    fn test_same_row() {
        let label = BoundingBox::new(60.0, 332.4, 118.0, 344.0);
        assert!(label.same_row(&BoundingBox::new(121.0, 332.0, 200.0, 343.6)));
        assert!(label.same_row(&BoundingBox::new(20.0, 330.0, 35.0, 345.0)));
        assert!(!label.same_row(&BoundingBox::new(60.0, 350.0, 200.0, 362.0)));
        assert!(!label.same_row(&BoundingBox::new(60.0, 341.0, 200.0, 353.0)));
    }

    #[test]
    fn test_overlaps_rows() {
        let bbox = BoundingBox::new(0.0, 100.0, 50.0, 120.0);
        assert!(bbox.overlaps_rows(110.0, 130.0));
        assert!(bbox.overlaps_rows(100.0, 120.0));
        assert!(bbox.overlaps_rows(90.0, 140.0));
        assert!(!bbox.overlaps_rows(120.0, 140.0));
        assert!(!bbox.overlaps_rows(80.0, 100.0));
    }
}
