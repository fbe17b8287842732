//! Tally CLI - Bank statement extraction and classification
//!
//! Usage:
//!   tally extract statement.pdf --format csv   Extract operations
//!   tally summary statement.pdf                Show header fields
//!   tally classify "AGROBAZAR SHOP 02"         Classify descriptions
//!   tally ingest statement.pdf                 Extract, dedup and classify
//!   tally --db rules.db rules import           Load the rules file into the rule store
//!   tally --db rules.db rules stats 12         Show how often a stored rule was used

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let rules = cli.rules.as_deref();
    let db = cli.db.as_deref();

    match cli.command {
        Commands::Extract {
            file,
            format,
            output,
        } => commands::cmd_extract(&file, &format, output.as_deref()),
        Commands::Summary { file } => commands::cmd_summary(&file),
        Commands::Classify { descriptions, json } => {
            let classifier = commands::load_classifier(rules, db)?;
            commands::cmd_classify(&classifier, &descriptions, json)
        }
        Commands::Ingest { file, hashes, json } => {
            let classifier = commands::load_classifier(rules, db)?;
            let store = db.map(commands::open_store).transpose()?;
            commands::cmd_ingest(&classifier, store.as_ref(), &file, hashes.as_deref(), json)
        }
        Commands::Rules { action } => match action {
            RulesAction::Validate => commands::cmd_rules_validate(rules),
            RulesAction::Test { description } => commands::cmd_rules_test(rules, db, &description),
            RulesAction::Import => commands::cmd_rules_import(&commands::store_for(db)?, rules),
            RulesAction::List {
                rule_type,
                category,
                all,
            } => commands::cmd_rules_list(
                &commands::store_for(db)?,
                rule_type.as_deref(),
                category.as_deref(),
                all,
            ),
            RulesAction::Add {
                category,
                pattern,
                rule_type,
                weight,
                priority,
            } => commands::cmd_rules_add(
                &commands::store_for(db)?,
                &rule_type,
                &category,
                &pattern,
                weight,
                priority,
            ),
            RulesAction::Edit {
                id,
                category,
                pattern,
                rule_type,
                weight,
                priority,
            } => commands::cmd_rules_edit(
                &commands::store_for(db)?,
                id,
                commands::RuleEdit {
                    rule_type,
                    category,
                    pattern,
                    weight,
                    priority,
                },
            ),
            RulesAction::Priority { updates } => {
                commands::cmd_rules_priority(&commands::store_for(db)?, &updates)
            }
            RulesAction::Categories => commands::cmd_rules_categories(&commands::store_for(db)?),
            RulesAction::Delete { id } => commands::cmd_rules_delete(&commands::store_for(db)?, id),
            RulesAction::Enable { id } => {
                commands::cmd_rules_set_active(&commands::store_for(db)?, id, true)
            }
            RulesAction::Disable { id } => {
                commands::cmd_rules_set_active(&commands::store_for(db)?, id, false)
            }
            RulesAction::Stats { id } => commands::cmd_rules_stats(&commands::store_for(db)?, id),
        },
    }
}
