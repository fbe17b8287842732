//! Tally Core Library
//!
//! Shared functionality for the Tally statement tool:
//! - European number normalization
//! - Document model with a PDF text backend
//! - Statement extraction (tables, text-line fallback, summary fields)
//! - Operation hashing and deduplication
//! - Classification rules from YAML or SQLite
//! - Hybrid classifier (exact, fuzzy, keyword, pattern)
//! - Ingest pipeline tying extraction and classification together

pub mod classifier;
pub mod dedup;
pub mod document;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod numbers;
pub mod rules;
pub mod similarity;

pub use classifier::{high_confidence, needs_review, normalize, HybridClassifier};
pub use dedup::{operation_hash, Deduplicator};
pub use document::{Document, Page, Table};
pub use error::{Error, Result};
pub use extract::{ExtractorOptions, StatementExtractor};
pub use ingest::{IngestPipeline, IngestReport};
pub use models::*;
pub use numbers::{normalize_number, parse_amount};
pub use rules::{
    ClassifierSettings, RuleFilter, RuleSource, RuleStats, RulesConfig, SqliteRuleStore,
};
