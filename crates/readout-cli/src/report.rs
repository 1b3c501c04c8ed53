//! Batch report: one row per document, written as CSV or JSON.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use readout_core::{format_reading, DocumentOutcome};

/// Report file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Comma-separated values
    Csv,
    /// JSON document with a generation timestamp
    Json,
}

impl ReportFormat {
    /// Pick the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// One document's line in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Extracted Number")]
    pub extracted_number: Option<f64>,
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "Tokens", skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,
    /// JSON only; CSV keeps the fixed columns.
    #[serde(rename = "Processing Time (ms)")]
    pub processing_time_ms: u64,
}

impl ReportRow {
    pub fn from_outcome(outcome: &DocumentOutcome, with_tokens: bool) -> Self {
        let filename = outcome
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| outcome.path.display().to_string());

        match &outcome.result {
            Ok(result) => ReportRow {
                filename,
                extracted_number: result.selected_number,
                status: "ok",
                error: None,
                tokens: with_tokens.then(|| result.tokens_joined()),
                processing_time_ms: outcome.processing_time_ms,
            },
            Err(e) => ReportRow {
                filename,
                extracted_number: None,
                status: "error",
                error: Some(e.to_string()),
                tokens: with_tokens.then(String::new),
                processing_time_ms: outcome.processing_time_ms,
            },
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    documents: usize,
    failed: usize,
    rows: &'a [ReportRow],
}

pub fn rows(outcomes: &[DocumentOutcome], with_tokens: bool) -> Vec<ReportRow> {
    outcomes
        .iter()
        .map(|o| ReportRow::from_outcome(o, with_tokens))
        .collect()
}

/// Write the report in `format`.
pub fn write<W: Write>(
    writer: W,
    rows: &[ReportRow],
    format: ReportFormat,
    with_tokens: bool,
) -> anyhow::Result<()> {
    match format {
        ReportFormat::Csv => write_csv(writer, rows, with_tokens),
        ReportFormat::Json => write_json(writer, rows),
    }
}

fn write_csv<W: Write>(writer: W, rows: &[ReportRow], with_tokens: bool) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Filename", "Extracted Number", "Status", "Error"];
    if with_tokens {
        header.push("Tokens");
    }
    wtr.write_record(&header)?;

    for row in rows {
        let number = row.extracted_number.map(format_reading).unwrap_or_default();
        let mut record = vec![
            row.filename.as_str(),
            number.as_str(),
            row.status,
            row.error.as_deref().unwrap_or(""),
        ];
        if with_tokens {
            record.push(row.tokens.as_deref().unwrap_or(""));
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_json<W: Write>(writer: W, rows: &[ReportRow]) -> anyhow::Result<()> {
    let report = JsonReport {
        generated_at: Utc::now(),
        documents: rows.len(),
        failed: rows.iter().filter(|r| r.status == "error").count(),
        rows,
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}
