//! Statement command implementations (extract, summary)

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use tally_core::{models::StatementSummary, StatementExtractor, TransactionRecord};

use super::{format_amount, open_document};

/// Output format for extracted operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Write records as pretty JSON or CSV with a header row
pub fn write_records<W: Write>(
    records: &[TransactionRecord],
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)
                .context("Failed to serialize records to JSON")?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for record in records {
                wtr.serialize(record).context("Failed to write CSV row")?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

pub fn cmd_extract(file: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let format: OutputFormat = format
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{} (valid formats: json, csv)", e))?;

    let document = open_document(file)?;
    let records = StatementExtractor::default().extract_operations(&document);

    match output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_records(&records, format, out)?;
            eprintln!(
                "✅ Extracted {} operations to {}",
                records.len(),
                path.display()
            );
        }
        None => write_records(&records, format, io::stdout().lock())?,
    }

    Ok(())
}

/// Render the header fields as aligned lines
pub fn summary_lines(summary: &StatementSummary) -> Vec<String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    vec![
        format!("   Client:          {}", text(&summary.client_name)),
        format!("   Account:         {}", text(&summary.account_number)),
        format!("   Opening balance: {}", format_amount(summary.opening_balance)),
        format!("   Closing balance: {}", format_amount(summary.closing_balance)),
        format!("   Total outflow:   {}", format_amount(summary.total_outflow)),
    ]
}

pub fn cmd_summary(file: &Path) -> Result<()> {
    let document = open_document(file)?;
    let summary = StatementExtractor::default().extract_summary(&document);

    println!();
    println!("📄 Statement summary ({})", file.display());
    println!("   ─────────────────────────────────────────");
    for line in summary_lines(&summary) {
        println!("{}", line);
    }

    Ok(())
}
