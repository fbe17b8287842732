//! Statement ingestion: extract, deduplicate, classify
//!
//! Suggestions refer to records by their position in [`IngestReport::records`].

use serde::Serialize;
use tracing::info;

use crate::classifier::{high_confidence, needs_review, HybridClassifier};
use crate::dedup::Deduplicator;
use crate::document::Document;
use crate::error::Result;
use crate::extract::StatementExtractor;
use crate::models::{ClassificationSuggestion, StatementSummary, TransactionRecord};

/// Result of ingesting one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub summary: StatementSummary,
    /// New records, in document order
    pub records: Vec<TransactionRecord>,
    /// Records dropped as already seen
    pub duplicates: usize,
    pub suggestions: Vec<ClassificationSuggestion>,
}

impl IngestReport {
    pub fn auto_assignable(&self) -> Vec<ClassificationSuggestion> {
        high_confidence(&self.suggestions)
    }

    pub fn for_review(&self) -> Vec<ClassificationSuggestion> {
        needs_review(&self.suggestions)
    }

    /// Records with no suggestion at all
    pub fn unclassified(&self) -> Vec<&TransactionRecord> {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                !self
                    .suggestions
                    .iter()
                    .any(|s| s.operation_id == *i as i64)
            })
            .map(|(_, r)| r)
            .collect()
    }
}

/// Extractor and classifier wired together
pub struct IngestPipeline<'a> {
    extractor: &'a StatementExtractor,
    classifier: &'a HybridClassifier,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(extractor: &'a StatementExtractor, classifier: &'a HybridClassifier) -> Self {
        Self {
            extractor,
            classifier,
        }
    }

    /// Ingest a document, skipping records `dedup` has already seen
    pub fn ingest(&self, document: &Document, dedup: &mut Deduplicator) -> IngestReport {
        let statement = self.extractor.process(document);
        let extracted = statement.records.len();
        let records = dedup.filter_new(statement.records);
        let duplicates = extracted - records.len();

        let suggestions = self.classifier.suggest(
            records
                .iter()
                .enumerate()
                .filter_map(|(i, r)| r.description.as_deref().map(|d| (i as i64, d))),
        );

        info!(
            "Ingested {} records ({} duplicates, {} classified)",
            records.len(),
            duplicates,
            suggestions.len()
        );

        IngestReport {
            summary: statement.summary,
            records,
            duplicates,
            suggestions,
        }
    }

    /// Ingest raw PDF bytes
    pub fn ingest_pdf(&self, bytes: &[u8], dedup: &mut Deduplicator) -> Result<IngestReport> {
        let document = Document::from_pdf_bytes(bytes)?;
        Ok(self.ingest(&document, dedup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Page, Table};
    use crate::rules::RulesConfig;

    fn classifier() -> HybridClassifier {
        let yaml = r#"
exact_matches:
  MAGAZIN ABC: Food
keyword_matches:
  transport:
    keywords: [TAXI]
    weight: 70
    type: Transport
"#;
        HybridClassifier::new(RulesConfig::from_yaml_str(yaml).unwrap())
    }

    fn document() -> Document {
        let table = Table::from_rows(vec![
            vec!["Data", "Procesare", "Descriere", "Suma (LEI)"],
            vec!["01.08.2025", "02.08.2025", "MAGAZIN ABC", "-123,45"],
            vec!["03.08.2025", "04.08.2025", "TAXI CITY", "-50,00"],
            vec!["05.08.2025", "06.08.2025", "SOMETHING ELSE", "-7,00"],
            vec!["01.08.2025", "02.08.2025", "MAGAZIN ABC", "-123,45"],
        ]);
        Document::from_pages(vec![Page::new("Extras de cont").with_tables(vec![table])])
    }

    #[test]
    fn test_ingest_dedups_and_classifies() {
        let extractor = StatementExtractor::default();
        let classifier = classifier();
        let pipeline = IngestPipeline::new(&extractor, &classifier);

        let mut dedup = Deduplicator::new();
        let report = pipeline.ingest(&document(), &mut dedup);

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.suggestions.len(), 2);

        let first = &report.suggestions[0];
        assert_eq!(first.operation_id, 0);
        assert_eq!(first.category, "Food");
        assert!(first.should_auto_assign);

        // TAXI alone scores 75, below the keyword threshold
        assert_eq!(report.auto_assignable().len(), 1);
        assert_eq!(report.for_review().len(), 1);
        assert_eq!(report.for_review()[0].operation_id, 1);

        let unclassified = report.unclassified();
        assert_eq!(unclassified.len(), 1);
        assert_eq!(unclassified[0].description.as_deref(), Some("SOMETHING ELSE"));
    }

    #[test]
    fn test_second_ingest_finds_nothing_new() {
        let extractor = StatementExtractor::default();
        let classifier = classifier();
        let pipeline = IngestPipeline::new(&extractor, &classifier);

        let mut dedup = Deduplicator::new();
        pipeline.ingest(&document(), &mut dedup);
        let again = pipeline.ingest(&document(), &mut dedup);

        assert!(again.records.is_empty());
        assert!(again.suggestions.is_empty());
        assert_eq!(again.duplicates, 4);
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_ingest_pdf_rejects_garbage() {
        let extractor = StatementExtractor::default();
        let classifier = classifier();
        let pipeline = IngestPipeline::new(&extractor, &classifier);

        let mut dedup = Deduplicator::new();
        let result = pipeline.ingest_pdf(b"not a pdf", &mut dedup);
        assert!(matches!(result, Err(crate::error::Error::Document(_))));
        assert!(dedup.is_empty());
    }
}
