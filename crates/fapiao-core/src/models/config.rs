//! Configuration structures for the extraction pipeline.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FapiaoError, Result};

/// Main configuration for the fapiao pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// Field extraction and retry configuration.
    pub extraction: ExtractionConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// How the total amount is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountStrategy {
    /// Read the amount from the layout row of the 价税合计 anchor.
    #[default]
    Zone,
    /// Read `(小写)¥...` from recognized text, validate it and compare with the zone figure.
    OcrCrossChecked,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum recognition passes per document.
    pub max_attempts: u32,

    /// Minimum similarity ratio for the fuzzy validation fallback.
    pub fuzzy_threshold: f64,

    /// Allowed difference between recognized and zone amounts before logging.
    pub amount_tolerance: Decimal,

    /// Total amount strategy.
    pub amount_strategy: AmountStrategy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            fuzzy_threshold: 0.8,
            amount_tolerance: Decimal::new(1, 2),
            amount_strategy: AmountStrategy::Zone,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering the analyzed page before recognition.
    pub render_dpi: u32,

    /// Convert rendered pages to grayscale.
    pub grayscale: bool,

    /// Directory holding the pdfium shared library. Falls back to the
    /// working directory and then the system library path.
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            grayscale: true,
            pdfium_library_dir: None,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,

    /// Drop regions whose recognized text is blank.
    pub drop_empty: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            keep_unk: false,
            drop_empty: true,
        }
    }
}

/// Model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "ch_rec.onnx".to_string(),
            dictionary: "ppocr_keys_v1.txt".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }

    pub fn recognition_path(&self) -> PathBuf {
        self.model_dir.join(&self.recognition_model)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.model_dir.join(&self.dictionary)
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| FapiaoError::Config(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| FapiaoError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn check(&self) -> Result<()> {
        if self.extraction.max_attempts == 0 {
            return Err(FapiaoError::Config(
                "extraction.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.fuzzy_threshold) {
            return Err(FapiaoError::Config(format!(
                "extraction.fuzzy_threshold must be within [0, 1], got {}",
                self.extraction.fuzzy_threshold
            )));
        }
        if self.pdf.render_dpi == 0 {
            return Err(FapiaoError::Config("pdf.render_dpi must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = FapiaoConfig::default();
        assert_eq!(config.extraction.max_attempts, 5);
        assert_eq!(config.extraction.fuzzy_threshold, 0.8);
        assert_eq!(config.extraction.amount_tolerance, Decimal::new(1, 2));
        assert_eq!(config.pdf.render_dpi, 300);
        assert!(config.pdf.grayscale);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"extraction": {"max_attempts": 3, "amount_strategy": "ocr_cross_checked"}}"#,
        )
        .unwrap();

        let config = FapiaoConfig::from_file(&path).unwrap();
        assert_eq!(config.extraction.max_attempts, 3);
        assert_eq!(config.extraction.amount_strategy, AmountStrategy::OcrCrossChecked);
        assert_eq!(config.extraction.fuzzy_threshold, 0.8);
        assert_eq!(config.pdf.render_dpi, 300);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FapiaoConfig::default();
        config.pdf.pdfium_library_dir = Some(PathBuf::from("/opt/pdfium/lib"));
        config.save(&path).unwrap();

        let loaded = FapiaoConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.pdfium_library_dir, Some(PathBuf::from("/opt/pdfium/lib")));
        assert_eq!(loaded.models.recognition_model, "ch_rec.onnx");
    }

    #[test]
    fn test_check_rejects_zero_attempts() {
        let mut config = FapiaoConfig::default();
        config.extraction.max_attempts = 0;
        assert!(matches!(config.check(), Err(FapiaoError::Config(_))));
    }

    #[test]
    fn test_model_paths() {
        let models = ModelConfig {
            model_dir: PathBuf::from("/opt/fapiao"),
            ..ModelConfig::default()
        };
        assert_eq!(models.detection_path(), PathBuf::from("/opt/fapiao/det.onnx"));
        assert_eq!(models.recognition_path(), PathBuf::from("/opt/fapiao/ch_rec.onnx"));
        assert_eq!(models.dictionary_path(), PathBuf::from("/opt/fapiao/ppocr_keys_v1.txt"));
    }
}
