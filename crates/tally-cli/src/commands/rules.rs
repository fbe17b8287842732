//! Rules command implementations (validate, import, list, add, edit, delete, test)

use std::path::Path;

use anyhow::{bail, Context, Result};
use tally_core::{
    models::{ClassificationRule, RuleTestResult, RuleType},
    rules::{RuleFilter, RuleSource, SqliteRuleStore},
    IngestReport,
};

use super::{load_rules, open_store, truncate};

fn parse_rule_type(s: &str) -> Result<RuleType> {
    s.parse()
        .map_err(|e: String| anyhow::anyhow!("{} (valid types: exact, keyword, pattern)", e))
}

/// Rules that fail validation, paired with the reason
pub fn invalid_rules(rules: &[ClassificationRule]) -> Vec<(&ClassificationRule, String)> {
    rules
        .iter()
        .filter_map(|rule| rule.validate().err().map(|e| (rule, e.to_string())))
        .collect()
}

pub fn cmd_rules_validate(rules_path: Option<&Path>) -> Result<()> {
    let config = load_rules(rules_path)?;
    let rules = config.list_active_rules()?;

    println!("🔎 Rules file");
    println!("   Exact matches:    {}", config.exact_matches.len());
    println!("   Keyword groups:   {}", config.keyword_matches.len());
    println!("   Pattern groups:   {}", config.pattern_matches.len());
    println!("   Rules total:      {}", rules.len());

    let invalid = invalid_rules(&rules);
    if invalid.is_empty() {
        println!("✅ All rules are valid");
        return Ok(());
    }

    println!();
    for (rule, reason) in &invalid {
        println!(
            "   ❌ {} rule for {}: {} ({})",
            rule.rule_type,
            rule.category,
            truncate(&rule.pattern, 40),
            reason
        );
    }
    bail!("{} invalid rules", invalid.len())
}

pub fn cmd_rules_import(store: &SqliteRuleStore, rules_path: Option<&Path>) -> Result<()> {
    let config = load_rules(rules_path)?;
    let inserted = store.import_config(&config)?;
    println!("✅ Imported {} rules into the rule store", inserted);
    Ok(())
}

pub fn cmd_rules_list(
    store: &SqliteRuleStore,
    rule_type: Option<&str>,
    category: Option<&str>,
    all: bool,
) -> Result<()> {
    let filter = RuleFilter {
        rule_type: rule_type.map(parse_rule_type).transpose()?,
        category: category.map(String::from),
        active_only: !all,
    };
    let rules = store.list_rules(&filter)?;

    if rules.is_empty() {
        println!("No rules found. Import the rules file with:");
        println!("  tally --db <path> rules import");
        return Ok(());
    }

    println!();
    println!("📋 Classification Rules");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:>4} │ {:>3} │ {:20} │ {:8} │ Pattern",
        "ID", "Pri", "Wt", "Category", "Type"
    );
    println!("   ─────┼──────┼─────┼──────────────────────┼──────────┼─────────────────");

    for rule in rules {
        let inactive = if rule.is_active { "" } else { " (inactive)" };
        println!(
            "   {:>4} │ {:>4} │ {:>3} │ {:20} │ {:8} │ {}{}",
            rule.id.unwrap_or_default(),
            rule.priority,
            rule.weight,
            truncate(&rule.category, 20),
            rule.rule_type.as_str(),
            truncate(&rule.pattern, 30),
            inactive
        );
    }

    Ok(())
}

pub fn cmd_rules_add(
    store: &SqliteRuleStore,
    rule_type: &str,
    category: &str,
    pattern: &str,
    weight: u32,
    priority: i32,
) -> Result<()> {
    let rule_type = parse_rule_type(rule_type)?;
    let rule = ClassificationRule::new(rule_type, category, pattern, weight, priority);
    let id = store.insert_rule(&rule)?;
    println!(
        "✅ Created rule #{} for '{}': {} ({})",
        id,
        category,
        pattern,
        rule_type.as_str()
    );
    Ok(())
}

/// Field changes for `rules edit`; `None` keeps the stored value
#[derive(Debug, Default)]
pub struct RuleEdit {
    pub rule_type: Option<String>,
    pub category: Option<String>,
    pub pattern: Option<String>,
    pub weight: Option<u32>,
    pub priority: Option<i32>,
}

pub fn cmd_rules_edit(store: &SqliteRuleStore, id: i64, edit: RuleEdit) -> Result<()> {
    let Some(mut rule) = store.get_rule(id)? else {
        bail!("Rule #{} not found", id);
    };
    if let Some(rule_type) = edit.rule_type.as_deref() {
        rule.rule_type = parse_rule_type(rule_type)?;
    }
    if let Some(category) = edit.category {
        rule.category = category;
    }
    if let Some(pattern) = edit.pattern {
        rule.pattern = pattern;
    }
    if let Some(weight) = edit.weight {
        rule.weight = weight;
    }
    if let Some(priority) = edit.priority {
        rule.priority = priority;
    }
    store.update_rule(&rule)?;
    println!(
        "✅ Updated rule #{}: {} → {} ({}, weight {}, priority {})",
        id,
        rule.pattern,
        rule.category,
        rule.rule_type.as_str(),
        rule.weight,
        rule.priority
    );
    Ok(())
}

/// Parse `ID=PRIORITY` pairs
pub fn parse_priorities(pairs: &[String]) -> Result<Vec<(i64, i32)>> {
    pairs
        .iter()
        .map(|pair| {
            let (id, priority) = pair
                .split_once('=')
                .with_context(|| format!("Expected ID=PRIORITY, got '{}'", pair))?;
            let id = id
                .trim()
                .parse()
                .with_context(|| format!("Invalid rule ID in '{}'", pair))?;
            let priority = priority
                .trim()
                .parse()
                .with_context(|| format!("Invalid priority in '{}'", pair))?;
            Ok((id, priority))
        })
        .collect()
}

pub fn cmd_rules_priority(store: &SqliteRuleStore, pairs: &[String]) -> Result<()> {
    let updates = parse_priorities(pairs)?;
    let updated = store.set_priorities(&updates)?;
    if updated < updates.len() {
        bail!(
            "Updated {} of {} rules; the others were not found",
            updated,
            updates.len()
        );
    }
    println!("✅ Updated priority of {} rules", updated);
    Ok(())
}

pub fn cmd_rules_categories(store: &SqliteRuleStore) -> Result<()> {
    let categories = store.categories()?;
    if categories.is_empty() {
        println!("No active rules in the rule store");
        return Ok(());
    }
    println!("🏷️  Categories ({})", categories.len());
    for category in categories {
        println!("   {}", category);
    }
    Ok(())
}

pub fn cmd_rules_delete(store: &SqliteRuleStore, id: i64) -> Result<()> {
    if !store.delete_rule(id)? {
        bail!("Rule #{} not found", id);
    }
    println!("✅ Deleted rule #{}", id);
    Ok(())
}

pub fn cmd_rules_set_active(store: &SqliteRuleStore, id: i64, active: bool) -> Result<()> {
    store.set_active(id, active)?;
    let state = if active { "Enabled" } else { "Disabled" };
    println!("✅ {} rule #{}", state, id);
    Ok(())
}

pub fn cmd_rules_stats(store: &SqliteRuleStore, id: i64) -> Result<()> {
    let stats = store.rule_stats(id)?;
    println!("📊 Rule #{}", id);
    println!("   Uses:         {}", stats.usage_count);
    println!("   Successes:    {}", stats.success_count);
    println!("   Success rate: {:.2}%", stats.success_rate);
    println!(
        "   Last used:    {}",
        stats.last_used.as_deref().unwrap_or("never")
    );
    Ok(())
}

/// Count a use of every active stored rule behind an auto-assigned suggestion
///
/// Returns the number of uses recorded.
pub fn record_rule_matches(store: &SqliteRuleStore, report: &IngestReport) -> Result<usize> {
    let auto = report.auto_assignable();
    if auto.is_empty() {
        return Ok(0);
    }

    let rules = store.list_active_rules()?;
    let mut recorded = 0;
    for suggestion in &auto {
        for rule in &rules {
            let Some(id) = rule.id else { continue };
            if rule.explains(&suggestion.category, &suggestion.details) {
                store.record_match(id, true)?;
                recorded += 1;
            }
        }
    }
    Ok(recorded)
}

/// Rules that match a description, each with its test result
pub fn matching_rules(
    rules: Vec<ClassificationRule>,
    description: &str,
) -> Vec<(ClassificationRule, RuleTestResult)> {
    rules
        .into_iter()
        .map(|rule| {
            let result = rule.test_against(description);
            (rule, result)
        })
        .filter(|(_, result)| result.matches)
        .collect()
}

pub fn cmd_rules_test(
    rules_path: Option<&Path>,
    db: Option<&Path>,
    description: &str,
) -> Result<()> {
    let rules = match db {
        Some(db) => open_store(db)?.list_active_rules()?,
        None => load_rules(rules_path)?.list_active_rules()?,
    };
    let matches = matching_rules(rules, description);

    if matches.is_empty() {
        println!("No rules match \"{}\"", description);
        return Ok(());
    }

    println!();
    println!("🔍 Rules matching \"{}\":", description);
    println!("   ─────────────────────────────────────────────────────────────");
    for (rule, result) in matches {
        let id = rule
            .id
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:>5} │ {:8} │ {:20} │ {:>5.1} │ {}",
            id,
            rule.rule_type.as_str(),
            truncate(&rule.category, 20),
            result.confidence,
            truncate(&rule.pattern, 30)
        );
    }

    Ok(())
}
