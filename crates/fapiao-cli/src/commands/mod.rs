//! Subcommands.

pub mod batch;
pub mod config;
pub mod process;
pub mod sink;

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use fapiao_core::models::config::FapiaoConfig;
use fapiao_core::{PdfiumBackend, PureOcrEngine, RetryOrchestrator};

/// The production pipeline: pdfium layout and rendering, ONNX recognition.
pub type Pipeline = RetryOrchestrator<PdfiumBackend, PureOcrEngine>;

/// Overrides shared by `process` and `batch`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Directory holding the detection/recognition models and dictionary
    #[arg(short, long)]
    pub model_dir: Option<PathBuf>,

    /// Directory containing the pdfium shared library
    #[arg(long)]
    pub pdfium_dir: Option<PathBuf>,

    /// Maximum recognition passes per document
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut FapiaoConfig) {
        if let Some(dir) = &self.model_dir {
            config.models.model_dir = dir.clone();
        }
        if let Some(dir) = &self.pdfium_dir {
            config.pdf.pdfium_library_dir = Some(dir.clone());
        }
        if let Some(max_attempts) = self.max_attempts {
            config.extraction.max_attempts = max_attempts;
        }
    }
}

/// Bind pdfium and load the OCR models.
pub fn build_pipeline(config: &FapiaoConfig) -> anyhow::Result<Pipeline> {
    config.check()?;

    let backend = PdfiumBackend::new(&config.pdf).context("Failed to load pdfium")?;
    let recognizer = PureOcrEngine::from_config(&config.models, config.ocr.clone()).with_context(|| {
        format!(
            "Failed to load OCR models from {}",
            config.models.model_dir.display()
        )
    })?;
    debug!(
        max_attempts = config.extraction.max_attempts,
        strategy = ?config.extraction.amount_strategy,
        "pipeline ready"
    );

    Ok(RetryOrchestrator::with_config(backend, recognizer, config))
}
