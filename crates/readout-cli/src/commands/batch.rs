//! Batch processing command for many scanned forms.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use readout_core::{extract_all_with_progress, ExtractionPipeline};

use crate::report::{self, ReportFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Report file
    #[arg(short, long, default_value = "readout_results.csv")]
    output: PathBuf,

    /// Report format (default: from the report file extension)
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Add the merged tokens to the report
    #[arg(long)]
    with_tokens: bool,

    /// Exit with an error if any document fails (the report is still written)
    #[arg(long)]
    strict: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::config::load(config_path)?;

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", args.inputs.join(" "));
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let jobs = args.jobs.unwrap_or(config.batch.jobs);
    let pipeline = Arc::new(ExtractionPipeline::from_config(&config)?);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let pb = overall_pb.clone();
    let outcomes = extract_all_with_progress(pipeline, files, jobs, move |outcome| {
        if let Err(e) = &outcome.result {
            warn!("Failed to process {}: {}", outcome.path.display(), e);
        } else {
            debug!(
                "Processed {} in {}ms",
                outcome.path.display(),
                outcome.processing_time_ms
            );
        }
        pb.inc(1);
    })
    .await;

    overall_pb.finish_with_message("Complete");

    // Write report
    let format = args
        .format
        .unwrap_or_else(|| ReportFormat::from_path(&args.output));
    let rows = report::rows(&outcomes, args.with_tokens);

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(&args.output)?);
    report::write(writer, &rows, format, args.with_tokens)?;
    debug!("Wrote report to {}", args.output.display());

    // Print summary
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
    let found = outcomes
        .iter()
        .filter(|o| o.result.as_ref().is_ok_and(|r| r.has_reading()))
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} with a reading, {} without, {} failed",
        style(found).green(),
        style(outcomes.len() - found - failed.len()).yellow(),
        style(failed.len()).red()
    );
    println!(
        "{} Report written to {}",
        style("✓").green(),
        args.output.display()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                println!("  - {}", e);
            }
        }
    }

    check_failures(outcomes.len(), failed.len(), args.strict)
}

/// Exit status for a finished batch of `total` documents.
fn check_failures(total: usize, failed: usize, strict: bool) -> anyhow::Result<()> {
    if failed == total {
        anyhow::bail!("All {} documents failed", total);
    }
    if strict && failed > 0 {
        anyhow::bail!("{} of {} documents failed", failed, total);
    }
    Ok(())
}

/// Expand glob patterns, keeping PDF matches; plain paths pass through
/// unchanged so a missing file shows up as an error row.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !is_pattern(input) {
            files.push(PathBuf::from(input));
            continue;
        }

        let mut matched: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        matched.sort();

        if matched.is_empty() {
            warn!("Pattern matched no PDF files: {}", input);
        }
        files.extend(matched);
    }

    Ok(files)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
