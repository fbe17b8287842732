//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Extract and classify bank statement operations
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Bank statement extraction and operation classification", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Rules file (defaults to config/operations_matching.yaml, then the user config dir)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    /// Rule store database
    ///
    /// When set, classification rules are read from this SQLite store instead
    /// of the rules file. Thresholds still come from the rules file if one is found.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract operations from a statement PDF
    Extract {
        /// Statement PDF
        file: PathBuf,

        /// Output format: json, csv
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show statement header fields (client, account, balances)
    Summary {
        /// Statement PDF
        file: PathBuf,
    },

    /// Classify one or more descriptions
    Classify {
        /// Descriptions to classify
        #[arg(required = true)]
        descriptions: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract, deduplicate and classify a statement
    ///
    /// With --db, each auto-assigned operation counts as a use of the stored
    /// rules that matched it.
    Ingest {
        /// Statement PDF
        file: PathBuf,

        /// File of known operation hashes, one per line; new hashes are appended
        #[arg(long)]
        hashes: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage classification rules (validate, import, list, add, edit, test)
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Check the rules file and report what it contains
    Validate,

    /// Copy the rules file into the rule store (requires --db)
    Import,

    /// List rules in the rule store (requires --db)
    List {
        /// Only this rule type: exact, keyword, pattern
        #[arg(long = "type")]
        rule_type: Option<String>,

        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// Include inactive rules
        #[arg(long)]
        all: bool,
    },

    /// Add a rule to the rule store (requires --db)
    Add {
        /// Category to assign
        category: String,

        /// Pattern (merchant string, keyword or regex)
        pattern: String,

        /// Rule type: exact, keyword, pattern
        #[arg(long = "type", default_value = "keyword")]
        rule_type: String,

        /// Confidence weight (1-100)
        #[arg(long, default_value = "80")]
        weight: u32,

        /// Priority (higher first)
        #[arg(long, default_value = "0")]
        priority: i32,
    },

    /// Change fields of a stored rule (requires --db)
    Edit {
        /// Rule ID
        id: i64,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New pattern
        #[arg(long)]
        pattern: Option<String>,

        /// New rule type: exact, keyword, pattern
        #[arg(long = "type")]
        rule_type: Option<String>,

        /// New confidence weight (1-100)
        #[arg(long)]
        weight: Option<u32>,

        /// New priority
        #[arg(long)]
        priority: Option<i32>,
    },

    /// Reorder stored rules in one transaction (requires --db)
    Priority {
        /// Changes as ID=PRIORITY, e.g. 12=200
        #[arg(required = true)]
        updates: Vec<String>,
    },

    /// List the categories assigned by active stored rules (requires --db)
    Categories,

    /// Delete a rule from the rule store (requires --db)
    Delete {
        /// Rule ID
        id: i64,
    },

    /// Enable a rule (requires --db)
    Enable {
        /// Rule ID
        id: i64,
    },

    /// Disable a rule without deleting it (requires --db)
    Disable {
        /// Rule ID
        id: i64,
    },

    /// Show usage counters for a rule (requires --db)
    Stats {
        /// Rule ID
        id: i64,
    },

    /// Show which rules match a description
    Test {
        /// Description to test
        description: String,
    },
}
