//! Advisory diagnostics collected while processing a document.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::record::Field;

/// Which side log a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A candidate was replaced by its closest layout token.
    FuzzySubstitution {
        candidate: String,
        matched: String,
        score: f64,
    },
    /// More than one amount in the total-amount strip.
    ZoneAmbiguous { candidates: Vec<String> },
    /// No amount in the total-amount strip.
    AmountNotFound,
    /// Zone anchors absent from the layout.
    AnchorsMissing { missing: Vec<String> },
    /// Recognized and zone amounts disagree.
    AmountDiscrepancy { recognized: Decimal, zone: Decimal },
    /// The analyzed page has no layout text.
    ImageOnlyPage,
    /// A recognition pass failed.
    RecognitionFailed { attempt: u32, reason: String },
    /// A field was still empty when the attempt ceiling was reached.
    FieldUnresolved { attempts: u32 },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::FuzzySubstitution { .. }
            | DiagnosticKind::AmountDiscrepancy { .. }
            | DiagnosticKind::RecognitionFailed { .. } => Severity::Warning,
            DiagnosticKind::ZoneAmbiguous { .. }
            | DiagnosticKind::AmountNotFound
            | DiagnosticKind::AnchorsMissing { .. }
            | DiagnosticKind::ImageOnlyPage
            | DiagnosticKind::FieldUnresolved { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::FuzzySubstitution {
                candidate,
                matched,
                score,
            } => write!(f, "change {} to {} (similarity {:.2})", candidate, matched, score),
            DiagnosticKind::ZoneAmbiguous { candidates } => write!(
                f,
                "there are {} 价税合计 {:?}",
                candidates.len(),
                candidates
            ),
            DiagnosticKind::AmountNotFound => f.write_str("there are 0 价税合计"),
            DiagnosticKind::AnchorsMissing { missing } => {
                write!(f, "zone anchors not found: {}", missing.join(", "))
            }
            DiagnosticKind::AmountDiscrepancy { recognized, zone } => {
                write!(f, "recognized amount {} differs from zone amount {}", recognized, zone)
            }
            DiagnosticKind::ImageOnlyPage => {
                f.write_str("page has no layout text (image-only PDF), review manually")
            }
            DiagnosticKind::RecognitionFailed { attempt, reason } => {
                write!(f, "recognition failed on attempt {}: {}", attempt, reason)
            }
            DiagnosticKind::FieldUnresolved { attempts } => {
                write!(f, "unresolved after {} attempts", attempts)
            }
        }
    }
}

/// One diagnostic tied to a document and, usually, a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub document: String,
    pub field: Option<Field>,
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{} [{}] {}", self.document, field.label(), self.kind),
            None => write!(f, "{} {}", self.document, self.kind),
        }
    }
}

/// Collector passed down to validation and zone resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic; severity follows from the kind.
    ///
    /// A diagnostic identical to one already recorded is dropped, so a
    /// zone failure that repeats on every attempt is reported once.
    pub fn push(&mut self, document: &str, field: Option<Field>, kind: DiagnosticKind) {
        self.insert(Diagnostic {
            document: document.to_string(),
            field,
            severity: kind.severity(),
            kind,
        });
    }

    fn insert(&mut self, diagnostic: Diagnostic) {
        if !self.entries.contains(&diagnostic) {
            self.entries.push(diagnostic);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for diagnostic in other.entries {
            self.insert(diagnostic);
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
