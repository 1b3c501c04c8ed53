//! Process command - read the value off a single PDF.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use readout_core::{format_reading, ExtractionPipeline, ExtractionResult};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Save the cropped region as a PNG for inspection
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Also print the merged tokens
    #[arg(long)]
    show_tokens: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
}

#[derive(Serialize)]
struct ProcessOutput<'a> {
    file: String,
    #[serde(flatten)]
    result: &'a ExtractionResult,
    processing_time_ms: u64,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    if let Some(snapshot) = &args.snapshot {
        config.render.debug_snapshot = Some(snapshot.clone());
    }

    info!("Processing file: {}", args.input.display());

    let pipeline = ExtractionPipeline::from_config(&config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message(format!("Reading {}...", args.input.display()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    // Rendering and OCR block; keep them off the runtime threads
    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.extract(&input)).await?;

    pb.finish_and_clear();
    let result = result?;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    match args.format {
        OutputFormat::Json => {
            let output = ProcessOutput {
                file: args.input.display().to_string(),
                result: &result,
                processing_time_ms,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            match result.selected_number {
                Some(value) => println!(
                    "{} {}: {}",
                    style("✓").green(),
                    args.input.display(),
                    style(format_reading(value)).bold()
                ),
                None => println!(
                    "{} {}: no reading found",
                    style("✗").yellow(),
                    args.input.display()
                ),
            }
            if args.show_tokens {
                println!("   tokens: [{}]", result.tokens_joined());
            }
            if let Some(snapshot) = &config.render.debug_snapshot {
                println!(
                    "{} Region saved to {}",
                    style("ℹ").blue(),
                    snapshot.display()
                );
            }
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
