//! Reconciles OCR candidates against the layout text.
//!
//! Recognized text is good at content but may encode punctuation
//! differently from the native text stream. Every candidate is anchored
//! back to the layout text, so output values carry the layout's symbols:
//!
//! 1. exact search after normalizing both sides ([`normalize`]);
//! 2. otherwise the closest whitespace-separated layout token whose
//!    similarity ratio reaches the threshold, reported as a warning;
//! 3. otherwise the candidate is rejected.

use tracing::{trace, warn};

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::normalize::{normalize, tokenize};
use super::Result;
use crate::error::ExtractionError;
use crate::models::record::Field;

/// Default minimum similarity ratio for the fuzzy fallback.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Validator for OCR-derived field candidates.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    threshold: f64,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    /// Set the minimum similarity ratio for the fuzzy fallback.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return the layout-sourced form of `candidate`.
    pub fn validate<S: AsRef<str>>(
        &self,
        candidate: &str,
        layout_texts: &[S],
        field: Field,
        document: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<String> {
        let not_validated = || ExtractionError::NotValidated {
            field,
            candidate: candidate.to_string(),
        };

        if candidate.is_empty() {
            return Err(not_validated());
        }

        if let Some(exact) = exact_match(candidate, layout_texts) {
            trace!(%field, candidate, "exact layout match");
            return Ok(exact);
        }

        let tokens = tokenize(layout_texts);
        let (matched, score) = self.closest_match(candidate, &tokens).ok_or_else(not_validated)?;

        warn!(document, %field, candidate, matched = %matched, score, "fuzzy substitution");
        diagnostics.push(
            document,
            Some(field),
            DiagnosticKind::FuzzySubstitution {
                candidate: candidate.to_string(),
                matched: matched.clone(),
                score,
            },
        );
        Ok(matched)
    }

    /// Highest-scoring token at or above the threshold; ties keep the earliest.
    fn closest_match(&self, candidate: &str, tokens: &[String]) -> Option<(String, f64)> {
        let mut best: Option<(&String, f64)> = None;
        for token in tokens {
            let score = similarity(candidate, token);
            if score < self.threshold {
                continue;
            }
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((token, score));
            }
        }
        best.map(|(token, score)| (token.clone(), score))
    }
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Similarity ratio in `[0, 1]` over chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// First normalized occurrence of `candidate`, sliced from the original text.
pub fn exact_match<S: AsRef<str>>(candidate: &str, layout_texts: &[S]) -> Option<String> {
    let needle = normalize(candidate);
    let len = needle.chars().count();

    layout_texts.iter().find_map(|text| {
        let text = text.as_ref();
        let haystack = normalize(text);
        let byte_pos = haystack.find(&needle)?;
        let char_pos = haystack[..byte_pos].chars().count();
        Some(text.chars().skip(char_pos).take(len).collect())
    })
}
