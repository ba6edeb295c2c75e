//! Per-document extraction record.

use std::fmt;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::invoice::rules::patterns::CONTRACT_NUMBER;

/// Number of trailing characters kept for the short invoice number.
const SHORT_NUMBER_LEN: usize = 8;

/// The five extracted fields of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Invoice type (发票类型).
    Kind,
    /// Invoice number (发票号码).
    Number,
    /// Buyer and seller names and tax IDs (名称税号).
    Parties,
    /// Total amount including tax (价税合计).
    Amount,
    /// Remarks box (备注).
    Remarks,
}

impl Field {
    /// All fields in processing order.
    pub const ALL: [Field; 5] = [
        Field::Kind,
        Field::Number,
        Field::Parties,
        Field::Amount,
        Field::Remarks,
    ];

    /// Label as printed on the invoice.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Kind => "发票类型",
            Field::Number => "发票号码",
            Field::Parties => "名称税号",
            Field::Amount => "合计金额",
            Field::Remarks => "备注",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Kind => "kind",
            Field::Number => "number",
            Field::Parties => "parties",
            Field::Amount => "amount",
            Field::Remarks => "remarks",
        };
        f.write_str(name)
    }
}

/// State of one field slot.
///
/// A resolved slot may legitimately hold an empty string or a zero amount;
/// emptiness never means "still unresolved".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FieldSlot<T> {
    Unresolved,
    Resolved(T),
}

impl<T> Default for FieldSlot<T> {
    fn default() -> Self {
        FieldSlot::Unresolved
    }
}

impl<T> FieldSlot<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldSlot::Resolved(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FieldSlot::Resolved(value) => Some(value),
            FieldSlot::Unresolved => None,
        }
    }
}

/// Invoice type label found in the layout text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// 增值税专用发票
    SpecialVat,
    /// 普通发票
    Ordinary,
    /// No known type label on the page.
    Unrecognized,
}

impl InvoiceKind {
    /// Parse one of the known type labels.
    pub fn from_label(label: &str) -> Self {
        match label {
            "增值税专用发票" => InvoiceKind::SpecialVat,
            "普通发票" => InvoiceKind::Ordinary,
            _ => InvoiceKind::Unrecognized,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceKind::SpecialVat => "增值税专用发票",
            InvoiceKind::Ordinary => "普通发票",
            InvoiceKind::Unrecognized => "未识别发票类型",
        }
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Buyer and seller identification in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyInfo {
    pub buyer_name: String,
    pub buyer_tax_id: String,
    pub seller_name: String,
    pub seller_tax_id: String,
}

/// Slots for every extracted field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub kind: FieldSlot<InvoiceKind>,
    pub number: FieldSlot<String>,
    pub parties: FieldSlot<PartyInfo>,
    pub amount: FieldSlot<Decimal>,
    pub remarks: FieldSlot<String>,
}

impl FieldResult {
    pub fn is_resolved(&self, field: Field) -> bool {
        match field {
            Field::Kind => self.kind.is_resolved(),
            Field::Number => self.number.is_resolved(),
            Field::Parties => self.parties.is_resolved(),
            Field::Amount => self.amount.is_resolved(),
            Field::Remarks => self.remarks.is_resolved(),
        }
    }

    pub fn all_resolved(&self) -> bool {
        Field::ALL.iter().all(|field| self.is_resolved(*field))
    }

    /// Fields still waiting for a value, in processing order.
    pub fn unresolved(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|field| !self.is_resolved(*field))
            .collect()
    }
}

/// Lifecycle of a document through the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    #[default]
    Unprocessed,
    Recognizing,
    /// Every slot resolved.
    Resolved,
    /// Attempt ceiling reached with unresolved slots.
    Exhausted,
}

/// Extraction record for one input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Absolute path of the source document.
    pub path: PathBuf,
    pub fields: FieldResult,
    pub state: ProcessingState,
    /// Recognition passes performed.
    pub attempts: u32,
}

impl DocumentRecord {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fields: FieldResult::default(),
            state: ProcessingState::Unprocessed,
            attempts: 0,
        }
    }

    /// Last eight characters of the invoice number.
    pub fn short_number(&self) -> Option<String> {
        let number = self.fields.number.value()?;
        let count = number.chars().count();
        Some(number.chars().skip(count.saturating_sub(SHORT_NUMBER_LEN)).collect())
    }

    /// Contract number quoted in the remarks (`合同编号：BS...`), without the `BS` prefix.
    pub fn contract_number(&self) -> Option<String> {
        let remarks = self.fields.remarks.value()?.trim();
        CONTRACT_NUMBER
            .captures(remarks)
            .map(|caps| caps[1].to_string())
    }
}
