//! Layout text and page rendering backed by pdfium.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, trace};

use super::{sort_by_reading_order, BoundingBox, DocumentBackend, Result, TextBlock};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF backend using the pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    grayscale: bool,
}

impl PdfiumBackend {
    /// Bind pdfium from the configured directory, the working directory,
    /// or the system library path, in that order.
    pub fn new(config: &PdfConfig) -> Result<Self> {
        let local = PathBuf::from("./");
        let preferred = config.pdfium_library_dir.clone().unwrap_or_else(|| local.clone());

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&preferred))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&local)))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| PdfError::Bind(e.to_string()))?;

        debug!("Bound pdfium (preferred dir {})", preferred.display());

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            grayscale: config.grayscale,
        })
    }

    fn load<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PdfError::Load(format!("{}: {}", path.display(), e)))
    }

    fn page_index(page: u32) -> Result<PdfPageIndex> {
        PdfPageIndex::try_from(page).map_err(|_| PdfError::InvalidPage(page))
    }
}

impl DocumentBackend for PdfiumBackend {
    fn page_count(&self, path: &Path) -> Result<u32> {
        let document = self.load(path)?;
        Ok(document.pages().len() as u32)
    }

    fn layout_blocks(&self, path: &Path, page: u32) -> Result<Vec<TextBlock>> {
        let document = self.load(path)?;
        let pdf_page = document
            .pages()
            .get(Self::page_index(page)?)
            .map_err(|_| PdfError::InvalidPage(page))?;
        let page_height = pdf_page.height().value;

        let text = pdf_page
            .text()
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let mut blocks = Vec::new();
        for segment in text.segments().iter() {
            let content = segment.text();
            let content = content.trim();
            if content.is_empty() {
                continue;
            }

            // pdfium uses a bottom-left origin
            let bounds = segment.bounds();
            let bbox = BoundingBox::new(
                bounds.left().value,
                page_height - bounds.top().value,
                bounds.right().value,
                page_height - bounds.bottom().value,
            );
            trace!("Segment {:?} at {:?}", content, bbox);
            blocks.push(TextBlock::new(content, bbox));
        }

        sort_by_reading_order(&mut blocks);
        debug!("Extracted {} layout blocks from page {}", blocks.len(), page);
        Ok(blocks)
    }

    fn render_page(&self, path: &Path, page: u32, dpi: u32) -> Result<DynamicImage> {
        let document = self.load(path)?;
        let pdf_page = document
            .pages()
            .get(Self::page_index(page)?)
            .map_err(|_| PdfError::InvalidPage(page))?;

        // 72 points per inch
        let scale = dpi as f32 / 72.0;
        let width = (pdf_page.width().value * scale) as i32;
        let height = (pdf_page.height().value * scale) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = pdf_page
            .render_with_config(&render_config)
            .map_err(|e| PdfError::Render {
                page,
                reason: e.to_string(),
            })?;

        let image = bitmap.as_image();
        debug!("Rendered page {} at {} DPI: {}x{}", page, dpi, width, height);

        if self.grayscale {
            Ok(DynamicImage::ImageLuma8(image.to_luma8()))
        } else {
            Ok(image)
        }
    }
}
