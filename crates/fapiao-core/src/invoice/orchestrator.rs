//! Per-document retry loop.
//!
//! Layout text and the rendered page are obtained once per document. Each
//! attempt runs a fresh recognition pass and re-runs only the extractors
//! whose slot is still unresolved, until every slot resolves or the attempt
//! ceiling is reached.

use std::path::Path;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::rules::{
    ExtractionContext, FieldExtractor, KindExtractor, NumberExtractor, OcrAmountExtractor,
    PartyExtractor, RemarksExtractor, ZoneAmountExtractor,
};
use super::validator::FieldValidator;
use crate::error::PdfError;
use crate::models::config::{AmountStrategy, ExtractionConfig, FapiaoConfig};
use crate::models::record::{DocumentRecord, FieldSlot, InvoiceKind, PartyInfo, ProcessingState};
use crate::ocr::RecognitionProvider;
use crate::pdf::DocumentBackend;

/// One extractor per field slot.
pub struct ExtractorSet {
    pub kind: Box<dyn FieldExtractor<Output = InvoiceKind>>,
    pub number: Box<dyn FieldExtractor<Output = String>>,
    pub parties: Box<dyn FieldExtractor<Output = PartyInfo>>,
    pub amount: Box<dyn FieldExtractor<Output = Decimal>>,
    pub remarks: Box<dyn FieldExtractor<Output = String>>,
}

impl ExtractorSet {
    pub fn new() -> Self {
        Self {
            kind: Box::new(KindExtractor),
            number: Box::new(NumberExtractor),
            parties: Box::new(PartyExtractor),
            amount: Box::new(ZoneAmountExtractor),
            remarks: Box::new(RemarksExtractor),
        }
    }

    /// Default extractors with the configured amount strategy.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let set = Self::new();
        match config.amount_strategy {
            AmountStrategy::Zone => set,
            AmountStrategy::OcrCrossChecked => {
                set.with_amount(OcrAmountExtractor::new(config.amount_tolerance))
            }
        }
    }

    pub fn with_kind(mut self, extractor: impl FieldExtractor<Output = InvoiceKind> + 'static) -> Self {
        self.kind = Box::new(extractor);
        self
    }

    pub fn with_number(mut self, extractor: impl FieldExtractor<Output = String> + 'static) -> Self {
        self.number = Box::new(extractor);
        self
    }

    pub fn with_parties(mut self, extractor: impl FieldExtractor<Output = PartyInfo> + 'static) -> Self {
        self.parties = Box::new(extractor);
        self
    }

    pub fn with_amount(mut self, extractor: impl FieldExtractor<Output = Decimal> + 'static) -> Self {
        self.amount = Box::new(extractor);
        self
    }

    pub fn with_remarks(mut self, extractor: impl FieldExtractor<Output = String> + 'static) -> Self {
        self.remarks = Box::new(extractor);
        self
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished record and everything reported while producing it.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub record: DocumentRecord,
    pub diagnostics: Diagnostics,
}

/// Run `extractor` unless the slot already holds a value.
fn fill<T>(
    slot: &mut FieldSlot<T>,
    extractor: &dyn FieldExtractor<Output = T>,
    ctx: &ExtractionContext<'_>,
    diagnostics: &mut Diagnostics,
) {
    if slot.is_resolved() {
        return;
    }
    let field = extractor.field();
    match extractor.extract(ctx, diagnostics) {
        Ok(value) => {
            debug!(document = ctx.document, %field, "field resolved");
            *slot = FieldSlot::Resolved(value);
        }
        Err(e) => {
            debug!(document = ctx.document, %field, error = %e, "field unresolved this attempt");
        }
    }
}

/// Drives recognition and extraction for one document at a time.
pub struct RetryOrchestrator<B, R> {
    backend: B,
    recognizer: R,
    extractors: ExtractorSet,
    validator: FieldValidator,
    max_attempts: u32,
    render_dpi: u32,
}

impl<B: DocumentBackend, R: RecognitionProvider> RetryOrchestrator<B, R> {
    pub fn new(backend: B, recognizer: R) -> Self {
        Self::with_config(backend, recognizer, &FapiaoConfig::default())
    }

    pub fn with_config(backend: B, recognizer: R, config: &FapiaoConfig) -> Self {
        Self {
            backend,
            recognizer,
            extractors: ExtractorSet::from_config(&config.extraction),
            validator: FieldValidator::new().with_threshold(config.extraction.fuzzy_threshold),
            max_attempts: config.extraction.max_attempts,
            render_dpi: config.pdf.render_dpi,
        }
    }

    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Process the last page of the document at `path`.
    ///
    /// Unresolved fields never fail the call; only backend faults do.
    pub fn process(&self, path: impl AsRef<Path>) -> crate::Result<ProcessedDocument> {
        let start = Instant::now();
        let path = std::path::absolute(path.as_ref())?;
        let document = path.display().to_string();
        let mut record = DocumentRecord::new(&path);
        let mut diagnostics = Diagnostics::new();

        let pages = self.backend.page_count(&path)?;
        let page = pages.checked_sub(1).ok_or(PdfError::NoPages)?;
        debug!(document, pages, "analyzing last page");

        let layout = self.backend.layout_blocks(&path, page)?;
        if layout.is_empty() {
            warn!(document, "no layout text on page, needs manual review");
            diagnostics.push(&document, None, DiagnosticKind::ImageOnlyPage);
        }
        let layout_texts: Vec<String> = layout.iter().map(|block| block.text.clone()).collect();
        let image = self.backend.render_page(&path, page, self.render_dpi)?;

        while record.attempts < self.max_attempts {
            record.attempts += 1;
            record.state = ProcessingState::Recognizing;

            let recognized = match self.recognizer.recognize(&image) {
                Ok(texts) => texts,
                Err(e) => {
                    warn!(document, attempt = record.attempts, error = %e, "recognition failed");
                    diagnostics.push(
                        &document,
                        None,
                        DiagnosticKind::RecognitionFailed {
                            attempt: record.attempts,
                            reason: e.to_string(),
                        },
                    );
                    Vec::new()
                }
            };
            debug!(document, attempt = record.attempts, strings = recognized.len(), "recognition pass");

            let ctx = ExtractionContext {
                document: &document,
                recognized: &recognized,
                layout: &layout,
                layout_texts: &layout_texts,
                validator: &self.validator,
            };
            let fields = &mut record.fields;
            fill(&mut fields.kind, self.extractors.kind.as_ref(), &ctx, &mut diagnostics);
            fill(&mut fields.number, self.extractors.number.as_ref(), &ctx, &mut diagnostics);
            fill(&mut fields.parties, self.extractors.parties.as_ref(), &ctx, &mut diagnostics);
            fill(&mut fields.amount, self.extractors.amount.as_ref(), &ctx, &mut diagnostics);
            fill(&mut fields.remarks, self.extractors.remarks.as_ref(), &ctx, &mut diagnostics);

            if record.fields.all_resolved() {
                break;
            }
        }

        if record.fields.all_resolved() {
            record.state = ProcessingState::Resolved;
        } else {
            record.state = ProcessingState::Exhausted;
            for field in record.fields.unresolved() {
                error!(document, %field, attempts = record.attempts, "field unresolved");
                diagnostics.push(
                    &document,
                    Some(field),
                    DiagnosticKind::FieldUnresolved {
                        attempts: record.attempts,
                    },
                );
            }
        }

        info!(
            document,
            state = ?record.state,
            attempts = record.attempts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "document processed"
        );

        Ok(ProcessedDocument {
            record,
            diagnostics,
        })
    }
}
