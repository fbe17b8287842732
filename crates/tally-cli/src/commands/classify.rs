//! Classification command implementations (classify, ingest)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tally_core::{
    models::MatchResult, rules::SqliteRuleStore, Deduplicator, HybridClassifier, IngestPipeline,
    IngestReport, StatementExtractor,
};
use tracing::info;

use super::{extract::summary_lines, format_amount, open_document, record_rule_matches, truncate};

/// One classified description, as printed by `classify --json`
#[derive(Debug, Serialize)]
pub struct ClassifyOutput {
    pub description: String,
    pub result: Option<MatchResult>,
    pub should_auto_assign: bool,
}

pub fn classify_all(classifier: &HybridClassifier, descriptions: &[String]) -> Vec<ClassifyOutput> {
    descriptions
        .iter()
        .map(|description| {
            let result = classifier.classify(description);
            let should_auto_assign = result
                .as_ref()
                .map(|r| classifier.should_auto_assign(r))
                .unwrap_or(false);
            ClassifyOutput {
                description: description.clone(),
                result,
                should_auto_assign,
            }
        })
        .collect()
}

pub fn cmd_classify(
    classifier: &HybridClassifier,
    descriptions: &[String],
    json: bool,
) -> Result<()> {
    let outputs = classify_all(classifier, descriptions);

    if json {
        let out = serde_json::to_string_pretty(&outputs).context("Failed to serialize results")?;
        println!("{}", out);
        return Ok(());
    }

    println!();
    println!(
        "   {:30} │ {:20} │ {:>6} │ {:8} │ Auto",
        "Description", "Category", "Conf", "Method"
    );
    println!("   ───────────────────────────────┼──────────────────────┼────────┼──────────┼─────");
    for output in &outputs {
        match &output.result {
            Some(result) => println!(
                "   {:30} │ {:20} │ {:>6.1} │ {:8} │ {}",
                truncate(&output.description, 30),
                truncate(&result.category, 20),
                result.confidence,
                result.method.as_str(),
                if output.should_auto_assign { "yes" } else { "no" }
            ),
            None => println!(
                "   {:30} │ {:20} │ {:>6} │ {:8} │ -",
                truncate(&output.description, 30),
                "(unclassified)",
                "-",
                "-"
            ),
        }
    }

    Ok(())
}

/// Read known operation hashes, one per line; a missing file means none
pub fn read_known_hashes(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hashes file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Append the hashes of newly ingested records
pub fn append_hashes(path: &Path, report: &IngestReport) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open hashes file: {}", path.display()))?;
    for record in &report.records {
        writeln!(file, "{}", record.operation_hash())?;
    }
    Ok(())
}

pub fn ingest_file(
    classifier: &HybridClassifier,
    file: &Path,
    hashes: Option<&Path>,
) -> Result<IngestReport> {
    let document = open_document(file)?;

    let known = match hashes {
        Some(path) => read_known_hashes(path)?,
        None => Vec::new(),
    };
    let mut dedup = Deduplicator::with_known(known);

    let extractor = StatementExtractor::default();
    let report = IngestPipeline::new(&extractor, classifier).ingest(&document, &mut dedup);

    if let Some(path) = hashes {
        append_hashes(path, &report)?;
    }
    Ok(report)
}

/// Ingest a statement; with a rule store, auto-assigned matches count toward rule usage
pub fn cmd_ingest(
    classifier: &HybridClassifier,
    store: Option<&SqliteRuleStore>,
    file: &Path,
    hashes: Option<&Path>,
    json: bool,
) -> Result<()> {
    let report = ingest_file(classifier, file, hashes)?;

    if let Some(store) = store {
        let recorded = record_rule_matches(store, &report).context("Failed to record rule usage")?;
        info!("Recorded {} rule uses", recorded);
    }

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
        return Ok(());
    }

    println!();
    println!("📥 Ingested {}", file.display());
    for line in summary_lines(&report.summary) {
        println!("{}", line);
    }
    println!();
    println!("   New operations:     {}", report.records.len());
    println!("   Skipped duplicates: {}", report.duplicates);
    println!("   Auto-assignable:    {}", report.auto_assignable().len());
    println!("   Needs review:       {}", report.for_review().len());
    println!("   Unclassified:       {}", report.unclassified().len());

    if report.records.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "   {:>4} │ {:10} │ {:30} │ {:>10} │ {:20} │ {:>5}",
        "#", "Date", "Description", "Amount", "Category", "Conf"
    );
    println!("   ─────┼────────────┼────────────────────────────────┼────────────┼──────────────────────┼──────");
    for (i, record) in report.records.iter().enumerate() {
        let suggestion = report
            .suggestions
            .iter()
            .find(|s| s.operation_id == i as i64);
        let (category, confidence) = match suggestion {
            Some(s) => {
                let marker = if s.should_auto_assign { "" } else { "?" };
                (
                    format!("{}{}", truncate(&s.category, 19), marker),
                    format!("{:.0}", s.confidence),
                )
            }
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "   {:>4} │ {:10} │ {:30} │ {:>10} │ {:20} │ {:>5}",
            i,
            record.transaction_date.as_deref().unwrap_or("-"),
            truncate(record.description.as_deref().unwrap_or(""), 30),
            format_amount(record.amount_lei),
            category,
            confidence
        );
    }

    Ok(())
}
