//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `extract` - Statement commands (extract, summary)
//! - `classify` - Classification commands (classify, ingest)
//! - `rules` - Rules file and rule store maintenance

pub mod classify;
pub mod extract;
pub mod rules;

// Re-export command functions for main.rs
pub use classify::*;
pub use extract::*;
pub use rules::*;

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::{
    rules::{find_rules_file, ClassifierSettings, RulesConfig, SqliteRuleStore},
    Document, HybridClassifier,
};

/// Open a statement PDF
pub fn open_document(file: &Path) -> Result<Document> {
    Document::open(file).with_context(|| format!("Failed to read statement: {}", file.display()))
}

/// Open the rule store, creating it if needed
pub fn open_store(db_path: &Path) -> Result<SqliteRuleStore> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    SqliteRuleStore::open(path_str)
        .with_context(|| format!("Failed to open rule store: {}", db_path.display()))
}

/// Open the rule store named by --db, which is required here
pub fn store_for(db_path: Option<&Path>) -> Result<SqliteRuleStore> {
    let db_path = db_path.context("This command needs a rule store: pass --db <path>")?;
    open_store(db_path)
}

/// Load the rules file from --rules or the default locations
pub fn load_rules(rules: Option<&Path>) -> Result<RulesConfig> {
    let path = find_rules_file(rules).context("No rules file found (use --rules <path>)")?;
    RulesConfig::load(&path)
        .with_context(|| format!("Failed to load rules file: {}", path.display()))
}

/// Build the classifier from the rule store when --db is set, else the rules file
///
/// With a rule store, thresholds come from the rules file if one can be found
/// and fall back to defaults otherwise. An explicit --rules path must exist.
pub fn load_classifier(rules: Option<&Path>, db: Option<&Path>) -> Result<HybridClassifier> {
    let Some(db) = db else {
        return Ok(HybridClassifier::new(load_rules(rules)?));
    };

    let settings = match rules {
        Some(_) => load_rules(rules)?.settings(),
        None => match find_rules_file(None) {
            Ok(path) => RulesConfig::load(&path)
                .with_context(|| format!("Failed to load rules file: {}", path.display()))?
                .settings(),
            Err(_) => ClassifierSettings::default(),
        },
    };

    let store = open_store(db)?;
    HybridClassifier::from_source(&store, settings).context("Failed to read rules from store")
}

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an optional amount for display
pub fn format_amount(amount: Option<f64>) -> String {
    amount
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "-".to_string())
}
