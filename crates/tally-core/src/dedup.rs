//! Hash-based deduplication of extracted records
//!
//! The same statement is often uploaded more than once, and consecutive
//! statements can overlap. Each record gets a content hash over its
//! transaction date, description and amount; a [`Deduplicator`] keeps the
//! hashes it has seen and admits only new records.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

use crate::models::TransactionRecord;

/// Render an optional field the way stored hashes expect (`None` when absent)
fn render<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

/// Shortest round-trip form with at least one fractional digit (`10.0`, `123.45`)
fn render_amount(amount: f64) -> String {
    let s = amount.to_string();
    if amount.is_finite() && !s.contains('.') && !s.contains('e') {
        format!("{}.0", s)
    } else {
        s
    }
}

/// SHA-256 hex digest of `"{transaction_date}|{description}|{amount_lei}"`
pub fn operation_hash(record: &TransactionRecord) -> String {
    let key = format!(
        "{}|{}|{}",
        render(record.transaction_date.as_deref()),
        render(record.description.as_deref()),
        render(record.amount_lei.map(render_amount)),
    );
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Tracks seen operation hashes
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from hashes already stored elsewhere
    pub fn with_known<I, S>(hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: hashes.into_iter().map(Into::into).collect(),
        }
    }

    /// Record the hash and return true if this record was not seen before
    pub fn admit(&mut self, record: &TransactionRecord) -> bool {
        self.seen.insert(operation_hash(record))
    }

    pub fn contains(&self, record: &TransactionRecord) -> bool {
        self.seen.contains(&operation_hash(record))
    }

    /// Keep first occurrences of unseen records, in order
    pub fn filter_new(&mut self, records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
        let total = records.len();
        let kept: Vec<_> = records.into_iter().filter(|r| self.admit(r)).collect();
        if kept.len() < total {
            debug!("Dropped {} duplicate records", total - kept.len());
        }
        kept
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
