//! Batch processing command for a folder of invoice PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use fapiao_core::ProcessingState;

use super::sink::{run_dir_name, RunSink};
use super::{build_pipeline, PipelineArgs};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input folder (every *.pdf directly inside it) or a glob pattern
    #[arg(required = true)]
    input: String,

    /// Parent folder for the timestamped run folder
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Write results into this folder instead of a new timestamped one
    #[arg(long)]
    run_dir: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Expand the input argument into a sorted list of PDF files.
pub fn collect_inputs(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let dir = Path::new(input);
    let mut files: Vec<PathBuf> = if dir.is_dir() {
        fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_pdf(path))
            .collect()
    } else {
        glob(input)?
            .filter_map(|r| r.ok())
            .filter(|path| is_pdf(path))
            .collect()
    };
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", input);
    }
    Ok(files)
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    args.pipeline.apply(&mut config);

    let files = collect_inputs(&args.input)?;
    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pipeline = build_pipeline(&config)?;

    let run_dir = args
        .run_dir
        .clone()
        .unwrap_or_else(|| args.output_dir.join(run_dir_name(Local::now())));
    let mut sink = RunSink::create(&run_dir)?;
    info!("Writing results to {}", sink.dir().display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=>-"),
    );

    let mut resolved = 0usize;
    let mut incomplete = 0usize;
    let mut failed: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        pb.set_message(name.to_string());
        info!("Processing {}", path.display());

        match pipeline.process(path) {
            Ok(processed) => {
                sink.write_diagnostics(&processed.diagnostics)?;
                sink.write_record(&processed.record)?;
                if processed.record.state == ProcessingState::Resolved {
                    resolved += 1;
                } else {
                    incomplete += 1;
                }
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    sink.write_failure(path, &error_msg)?;
                    failed.push((path.clone(), error_msg));
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    sink.finish()?;
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    let csv_path = sink.finish()?;

    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} complete, {} incomplete, {} failed",
        style(resolved).green(),
        style(incomplete).yellow(),
        style(failed.len()).red()
    );
    println!(
        "{} Results written to {}",
        style("✓").green(),
        csv_path.display()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, error) in &failed {
            println!("  - {}: {}", path.display(), error);
        }
    }

    Ok(())
}
