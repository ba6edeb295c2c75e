//! Run output: the result CSV and the warning/error logs.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use fapiao_core::{Diagnostic, Diagnostics, DocumentRecord, Severity};

pub const RESULT_FILE: &str = "fa_piao_info.csv";
pub const WARNING_LOG: &str = "warning.log";
pub const ERROR_LOG: &str = "error.log";

/// Folder name for a run started at `time`.
pub fn run_dir_name(time: DateTime<Local>) -> String {
    time.format("%Y_%m_%d_%H_%M_%S").to_string()
}

/// One CSV row; unresolved fields are empty cells.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct InvoiceRow {
    #[serde(rename = "PDF绝对路径")]
    pub path: String,
    #[serde(rename = "发票类型")]
    pub kind: String,
    #[serde(rename = "发票号码")]
    pub number: String,
    #[serde(rename = "发票号码简写")]
    pub short_number: String,
    #[serde(rename = "购买方名称")]
    pub buyer_name: String,
    #[serde(rename = "购买方纳税人识别号")]
    pub buyer_tax_id: String,
    #[serde(rename = "销售方名称")]
    pub seller_name: String,
    #[serde(rename = "销售方纳税人识别号")]
    pub seller_tax_id: String,
    #[serde(rename = "价税合计金额")]
    pub amount: String,
    #[serde(rename = "备注")]
    pub remarks: String,
    #[serde(rename = "合同编号")]
    pub contract_number: String,
}

impl InvoiceRow {
    pub fn from_record(record: &DocumentRecord) -> Self {
        let fields = &record.fields;
        let parties = fields.parties.value();
        let party = |pick: fn(&fapiao_core::PartyInfo) -> &String| {
            parties.map(pick).cloned().unwrap_or_default()
        };

        Self {
            path: record.path.display().to_string(),
            kind: fields.kind.value().map(|k| k.label().to_string()).unwrap_or_default(),
            number: fields.number.value().cloned().unwrap_or_default(),
            short_number: record.short_number().unwrap_or_default(),
            buyer_name: party(|p| &p.buyer_name),
            buyer_tax_id: party(|p| &p.buyer_tax_id),
            seller_name: party(|p| &p.seller_name),
            seller_tax_id: party(|p| &p.seller_tax_id),
            amount: fields.amount.value().map(|a| a.to_string()).unwrap_or_default(),
            remarks: fields
                .remarks
                .value()
                .map(|r| r.trim().to_string())
                .unwrap_or_default(),
            contract_number: record.contract_number().unwrap_or_default(),
        }
    }

    /// Row for a document the pipeline could not open.
    pub fn failed(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            ..Self::default()
        }
    }
}

/// Writes one run's output folder.
pub struct RunSink {
    dir: PathBuf,
    rows: csv::Writer<File>,
    warnings: BufWriter<File>,
    errors: BufWriter<File>,
    written: usize,
}

impl RunSink {
    pub fn create(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            rows: csv::Writer::from_path(dir.join(RESULT_FILE))?,
            warnings: BufWriter::new(File::create(dir.join(WARNING_LOG))?),
            errors: BufWriter::new(File::create(dir.join(ERROR_LOG))?),
            written: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Append a finished record; flushed right away so an aborted run keeps
    /// every row written so far.
    pub fn write_record(&mut self, record: &DocumentRecord) -> anyhow::Result<()> {
        self.write_row(&InvoiceRow::from_record(record))
    }

    /// Append an empty row for `path` and log the fault.
    pub fn write_failure(&mut self, path: &Path, error: &str) -> anyhow::Result<()> {
        writeln!(self.errors, "{} {}: {}", timestamp(), path.display(), error)?;
        self.errors.flush()?;
        self.write_row(&InvoiceRow::failed(path))
    }

    pub fn write_diagnostics(&mut self, diagnostics: &Diagnostics) -> anyhow::Result<()> {
        for diagnostic in diagnostics.iter() {
            let log = match diagnostic.severity {
                Severity::Warning => &mut self.warnings,
                Severity::Error => &mut self.errors,
            };
            writeln!(log, "{} {}", timestamp(), diagnostic)?;
        }
        self.warnings.flush()?;
        self.errors.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.rows.flush()?;
        self.warnings.flush()?;
        self.errors.flush()?;
        Ok(self.dir.join(RESULT_FILE))
    }

    fn write_row(&mut self, row: &InvoiceRow) -> anyhow::Result<()> {
        self.rows.serialize(row)?;
        self.rows.flush()?;
        self.written += 1;
        Ok(())
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Print diagnostics to stderr, one per line.
pub fn print_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    use console::style;

    for diagnostic in diagnostics {
        let tag = match diagnostic.severity {
            Severity::Warning => style("warning").yellow(),
            Severity::Error => style("error").red(),
        };
        eprintln!("{}: {}", tag, diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fapiao_core::{DiagnosticKind, Field, FieldSlot, InvoiceKind, PartyInfo};
    use pretty_assertions::assert_eq;
    use fapiao_core::Decimal;

    fn resolved_record() -> DocumentRecord {
        let mut record = DocumentRecord::new("/data/invoices/a.pdf");
        record.fields.kind = FieldSlot::Resolved(InvoiceKind::SpecialVat);
        record.fields.number = FieldSlot::Resolved("24112000000012345678".to_string());
        record.fields.parties = FieldSlot::Resolved(PartyInfo {
            buyer_name: "甲方有限公司".into(),
            buyer_tax_id: "9111AAAA".into(),
            seller_name: "乙方有限公司".into(),
            seller_tax_id: "9222BBBB".into(),
        });
        record.fields.amount = FieldSlot::Resolved(Decimal::new(123456, 2));
        record.fields.remarks = FieldSlot::Resolved(" 合同编号：BS2024AB17 ".to_string());
        record
    }

    #[test]
    fn test_run_dir_name() {
        let time = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap();
        assert_eq!(run_dir_name(time), "2024_03_05_09_07_01");
    }

    #[test]
    fn test_row_from_resolved_record() {
        let row = InvoiceRow::from_record(&resolved_record());

        assert_eq!(
            row,
            InvoiceRow {
                path: "/data/invoices/a.pdf".into(),
                kind: "增值税专用发票".into(),
                number: "24112000000012345678".into(),
                short_number: "12345678".into(),
                buyer_name: "甲方有限公司".into(),
                buyer_tax_id: "9111AAAA".into(),
                seller_name: "乙方有限公司".into(),
                seller_tax_id: "9222BBBB".into(),
                amount: "1234.56".into(),
                remarks: "合同编号：BS2024AB17".into(),
                contract_number: "2024AB17".into(),
            }
        );
    }

    #[test]
    fn test_unresolved_fields_are_empty() {
        let mut record = DocumentRecord::new("/data/invoices/b.pdf");
        record.fields.kind = FieldSlot::Resolved(InvoiceKind::Unrecognized);

        let row = InvoiceRow::from_record(&record);

        assert_eq!(row.kind, "未识别发票类型");
        assert_eq!(row.number, "");
        assert_eq!(row.short_number, "");
        assert_eq!(row.amount, "");
        assert_eq!(row.contract_number, "");
    }

    #[test]
    fn test_sink_writes_csv_and_logs() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("2024_03_05_09_07_01");
        let mut sink = RunSink::create(&run_dir).unwrap();

        let mut diagnostics = Diagnostics::new();
        diagnostics.push(
            "/data/invoices/a.pdf",
            Some(Field::Number),
            DiagnosticKind::FuzzySubstitution {
                candidate: "0123".into(),
                matched: "0128".into(),
                score: 0.9,
            },
        );
        diagnostics.push("/data/invoices/a.pdf", None, DiagnosticKind::ImageOnlyPage);

        sink.write_record(&resolved_record()).unwrap();
        sink.write_diagnostics(&diagnostics).unwrap();
        sink.write_failure(Path::new("/data/invoices/c.pdf"), "no pages").unwrap();
        assert_eq!(sink.written(), 2);
        let csv_path = sink.finish().unwrap();

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers.len(), 11);
        assert_eq!(headers[0], "PDF绝对路径");
        assert_eq!(headers[10], "合同编号");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][8], "1234.56");
        assert_eq!(&rows[1][0], "/data/invoices/c.pdf");
        assert_eq!(&rows[1][2], "");

        let warnings = fs::read_to_string(run_dir.join(WARNING_LOG)).unwrap();
        assert_eq!(warnings.lines().count(), 1);
        assert!(warnings.contains("0128"));

        let errors = fs::read_to_string(run_dir.join(ERROR_LOG)).unwrap();
        assert_eq!(errors.lines().count(), 2);
        assert!(errors.contains("/data/invoices/c.pdf: no pages"));
    }
}
