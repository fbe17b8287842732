//! Statement extraction
//!
//! Turns a [`Document`] into a [`StatementSummary`] and an ordered list of
//! [`TransactionRecord`]s. Tables are the primary source; when no table yields
//! a record, individual text lines carrying a `<CCY> <amount>` token are parsed
//! instead.
//!
//! Extraction never fails on missing data. Unusable rows, tables and pages are
//! skipped and every summary field is independently optional.

mod summary;
mod tables;
mod text_lines;

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::document::Document;
use crate::models::{Statement, StatementSummary, TransactionRecord};

pub use tables::{detect_columns, ColumnMap};

/// Tunables for the extractor
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorOptions {
    /// Currency whose amounts are reported as absolute values
    pub local_currency: String,
    /// Currency codes recognised by the text-line fallback
    pub currencies: Vec<String>,
    /// Stop scanning after an anchored page once this many records exist
    pub early_exit_records: usize,
    /// Characters searched after a summary label for a number
    pub label_window: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            local_currency: "MDL".to_string(),
            currencies: vec!["MDL".to_string(), "USD".to_string(), "EUR".to_string()],
            early_exit_records: 5,
            label_window: 120,
        }
    }
}

/// Marks the card-operations section of a statement
fn card_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Cardul\s+num(?:e|ă|a)r|Cardul\s+number").expect("card anchor regex")
    })
}

pub fn has_card_anchor(text: &str) -> bool {
    card_anchor_re().is_match(text)
}

/// Stateless statement extractor
#[derive(Debug, Clone, Default)]
pub struct StatementExtractor {
    options: ExtractorOptions,
}

impl StatementExtractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Extract both the summary and the records
    pub fn process(&self, document: &Document) -> Statement {
        Statement {
            summary: self.extract_summary(document),
            records: self.extract_operations(document),
        }
    }

    /// Extract transaction records, falling back to text lines when tables yield none
    pub fn extract_operations(&self, document: &Document) -> Vec<TransactionRecord> {
        let records = self.extract_from_tables(document);
        debug!("Records from tables: {}", records.len());
        if !records.is_empty() {
            return records;
        }

        let text = document.full_text();
        let records = text_lines::extract_records(&text, &self.options);
        debug!("Records from text fallback: {}", records.len());
        records
    }

    /// Extract header-level fields
    pub fn extract_summary(&self, document: &Document) -> StatementSummary {
        let text = document.full_text();
        let mut summary = summary::search_labels(&text, self.options.label_window);
        if summary.total_outflow.is_none() {
            summary.total_outflow = tables::sum_debit_columns(document);
            if let Some(total) = summary.total_outflow {
                debug!("Total outflow computed from tables: {}", total);
            }
        }
        summary
    }

    fn extract_from_tables(&self, document: &Document) -> Vec<TransactionRecord> {
        let anchored: Vec<usize> = document
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| has_card_anchor(&page.text))
            .map(|(idx, _)| idx)
            .collect();
        let pages_to_scan: Vec<usize> = if anchored.is_empty() {
            (0..document.pages.len()).collect()
        } else {
            anchored
        };
        debug!(
            "Scanning {} of {} pages for tables",
            pages_to_scan.len(),
            document.pages.len()
        );

        let mut records = Vec::new();
        for idx in pages_to_scan {
            let page = &document.pages[idx];
            debug!("Page {}: {} tables found", idx + 1, page.tables.len());
            if page.tables.is_empty() {
                continue;
            }
            let anchor = has_card_anchor(&page.text);

            for table in &page.tables {
                records.extend(tables::records_from_table(table, anchor));
            }

            if anchor && records.len() >= self.options.early_exit_records {
                debug!("Card table found on page {}, stopping early", idx + 1);
                break;
            }
        }
        records
    }
}
