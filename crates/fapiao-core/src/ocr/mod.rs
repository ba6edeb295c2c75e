//! Text recognition over rendered pages.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;

use crate::error::OcrError;

/// An OCR engine that turns a page image into a flat bag of strings.
///
/// No positional information is returned and callers must not rely on the
/// order of the strings beyond concatenating them for pattern scanning.
pub trait RecognitionProvider {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError>;
}

impl<T: RecognitionProvider + ?Sized> RecognitionProvider for &T {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        (**self).recognize(image)
    }
}
