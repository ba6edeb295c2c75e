//! Process command - extract fields from a single invoice PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use fapiao_core::{Diagnostic, DocumentRecord, ProcessedDocument};

use super::sink::{print_diagnostics, InvoiceRow};
use super::{build_pipeline, PipelineArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print warnings and errors found during extraction
    #[arg(long)]
    show_diagnostics: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    record: &'a DocumentRecord,
    short_number: Option<String>,
    contract_number: Option<String>,
    diagnostics: Vec<&'a Diagnostic>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut config = super::config::load(config_path)?;
    args.pipeline.apply(&mut config);

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Loading models...");

    let pipeline = build_pipeline(&config)?;

    pb.set_message("Extracting fields...");
    let processed = pipeline.process(&args.input)?;
    pb.finish_and_clear();

    if args.show_diagnostics {
        print_diagnostics(processed.diagnostics.iter());
    }

    let output = format_document(&processed, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_document(processed: &ProcessedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let report = Report {
                record: &processed.record,
                short_number: processed.record.short_number(),
                contract_number: processed.record.contract_number(),
                diagnostics: processed.diagnostics.iter().collect(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Csv => format_csv(&processed.record),
        OutputFormat::Text => Ok(format_text(&processed.record)),
    }
}

fn format_csv(record: &DocumentRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.serialize(InvoiceRow::from_record(record))?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &DocumentRecord) -> String {
    let row = InvoiceRow::from_record(record);
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    let mut output = String::new();
    output.push_str(&format!("文件: {}\n", row.path));
    output.push_str(&format!("状态: {:?} ({} attempts)\n", record.state, record.attempts));
    output.push('\n');
    output.push_str(&format!("发票类型: {}\n", or_dash(&row.kind)));
    output.push_str(&format!("发票号码: {}\n", or_dash(&row.number)));
    output.push('\n');
    output.push_str("购买方:\n");
    output.push_str(&format!("  {}\n", or_dash(&row.buyer_name)));
    output.push_str(&format!("  税号: {}\n", or_dash(&row.buyer_tax_id)));
    output.push_str("销售方:\n");
    output.push_str(&format!("  {}\n", or_dash(&row.seller_name)));
    output.push_str(&format!("  税号: {}\n", or_dash(&row.seller_tax_id)));
    output.push('\n');
    output.push_str(&format!("价税合计: {}\n", or_dash(&row.amount)));
    output.push_str(&format!("备注: {}\n", or_dash(&row.remarks)));
    if !row.contract_number.is_empty() {
        output.push_str(&format!("合同编号: {}\n", row.contract_number));
    }

    output
}
