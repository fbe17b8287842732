//! Classification rules
//!
//! Rules come from a [`RuleSource`]: either the declarative rules file
//! ([`RulesConfig`]) or the mutable SQLite store ([`SqliteRuleStore`]). The
//! classifier consumes either one through [`RulesConfig::from_source`].

mod config;
mod sqlite;

use regex::RegexBuilder;

use crate::classifier::normalize;
use crate::error::{Error, Result};
use crate::models::{ClassificationRule, MatchDetails, RuleTestResult, RuleType};

pub use config::{
    find_rules_file, ClassifierSettings, ConfidenceThresholds, FuzzySettings, KeywordGroup,
    LearningSettings, PatternGroup, RulesConfig, DEFAULT_KEYWORD_WEIGHT, DEFAULT_PATTERN_WEIGHT,
    EXACT_RULE_PRIORITY, KEYWORD_RULE_PRIORITY, PATTERN_RULE_PRIORITY, RULES_FILE_NAME,
};
pub use sqlite::{RuleFilter, RuleStats, SqliteRuleStore};

/// Anything that can list the active classification rules
///
/// Rules are returned by priority (highest first), then weight.
pub trait RuleSource {
    fn list_active_rules(&self) -> Result<Vec<ClassificationRule>>;
}

impl ClassificationRule {
    /// Check the pattern is usable for its rule type
    pub fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(Error::InvalidRule(format!(
                "{} pattern cannot be empty",
                self.rule_type
            )));
        }
        if self.category.trim().is_empty() {
            return Err(Error::InvalidRule("category cannot be empty".to_string()));
        }
        if self.weight == 0 || self.weight > 100 {
            return Err(Error::InvalidRule(format!(
                "weight must be between 1 and 100, got {}",
                self.weight
            )));
        }
        if self.rule_type == RuleType::Pattern {
            RegexBuilder::new(&self.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::InvalidRule(format!("invalid regex pattern: {}", e)))?;
        }
        Ok(())
    }

    /// Evaluate this single rule against a sample description
    pub fn test_against(&self, test_string: &str) -> RuleTestResult {
        let matches = match self.rule_type {
            RuleType::Exact => test_string.to_lowercase() == self.pattern.to_lowercase(),
            RuleType::Keyword => test_string
                .to_lowercase()
                .contains(&self.pattern.to_lowercase()),
            RuleType::Pattern => RegexBuilder::new(&self.pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(test_string))
                .unwrap_or(false),
        };

        let confidence = match (matches, self.rule_type) {
            (false, _) => 0.0,
            (true, RuleType::Exact) => 100.0,
            (true, _) => self.weight as f64,
        };

        RuleTestResult {
            test_string: test_string.to_string(),
            matches,
            confidence,
            rule_pattern: self.pattern.clone(),
            rule_type: self.rule_type,
        }
    }

    /// Whether this rule is one the classifier used to reach `category`
    pub fn explains(&self, category: &str, details: &MatchDetails) -> bool {
        if self.category != category {
            return false;
        }
        match (self.rule_type, details) {
            (RuleType::Exact, MatchDetails::ExactEqual { description }) => {
                normalize(&self.pattern) == *description
            }
            (RuleType::Exact, MatchDetails::ExactSubstring { matched_pattern, .. })
            | (RuleType::Exact, MatchDetails::Fuzzy { matched_pattern, .. }) => {
                normalize(&self.pattern) == *matched_pattern
            }
            (RuleType::Keyword, MatchDetails::Keyword { matched_keywords, .. }) => {
                matched_keywords.contains(&self.pattern)
            }
            (RuleType::Pattern, MatchDetails::Pattern { matched_patterns, .. }) => {
                matched_patterns.contains(&self.pattern)
            }
            _ => false,
        }
    }
}
