//! Domain models for Tally

use serde::{Deserialize, Serialize};

/// One extracted statement line
///
/// Dates are kept exactly as printed on the statement; they are not parsed
/// because statements mix day-first and year-first layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_date: Option<String>,
    pub processed_date: Option<String>,
    pub description: Option<String>,
    /// Signed amount in the local currency
    pub amount_lei: Option<f64>,
}

impl TransactionRecord {
    /// Build a record, enforcing that description and amount are both present
    ///
    /// Returns None for incomplete rows, which the extractor silently drops.
    pub fn new(
        transaction_date: Option<String>,
        processed_date: Option<String>,
        description: Option<String>,
        amount_lei: Option<f64>,
    ) -> Option<Self> {
        let description = description.filter(|d| !d.trim().is_empty())?;
        let amount_lei = amount_lei?;
        Some(Self {
            transaction_date,
            processed_date,
            description: Some(description),
            amount_lei: Some(amount_lei),
        })
    }

    /// Stable content hash used for deduplication
    pub fn operation_hash(&self) -> String {
        crate::dedup::operation_hash(self)
    }
}

/// Header-level fields of one statement
///
/// Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub client_name: Option<String>,
    /// Uppercase, whitespace stripped
    pub account_number: Option<String>,
    pub total_outflow: Option<f64>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
}

/// Everything extracted from one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub summary: StatementSummary,
    pub records: Vec<TransactionRecord>,
}

/// Classification layer that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Keyword,
    Pattern,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Keyword => "keyword",
            Self::Pattern => "pattern",
        }
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "fuzzy" => Ok(Self::Fuzzy),
            "keyword" => Ok(Self::Keyword),
            "pattern" => Ok(Self::Pattern),
            _ => Err(format!("Unknown match method: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A runner-up candidate considered by the fuzzy layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyCandidate {
    pub pattern: String,
    pub category: String,
    pub similarity: f64,
}

/// Explainability metadata attached to a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchDetails {
    /// Identical after normalization
    ExactEqual { description: String },
    /// Containment in either direction
    ExactSubstring {
        matched_pattern: String,
        description: String,
    },
    Fuzzy {
        matched_pattern: String,
        similarity: f64,
        description: String,
        /// Qualifying candidates, best first
        candidates: Vec<FuzzyCandidate>,
    },
    Keyword {
        matched_keywords: Vec<String>,
        total_keywords: usize,
        category: String,
        description: String,
    },
    Pattern {
        matched_patterns: Vec<String>,
        total_patterns: usize,
        category: String,
        description: String,
    },
}

/// Output of one classification attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub category: String,
    /// 0-100
    pub confidence: f64,
    pub method: MatchMethod,
    pub details: MatchDetails,
}

/// A classification result for one operation in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSuggestion {
    pub operation_id: i64,
    pub category: String,
    pub confidence: f64,
    pub method: MatchMethod,
    pub details: MatchDetails,
    pub should_auto_assign: bool,
}

/// Kind of a stored classification rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Exact (or containment) match against the whole description
    Exact,
    /// Case-insensitive substring
    Keyword,
    /// Case-insensitive regular expression
    Pattern,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Keyword => "keyword",
            Self::Pattern => "pattern",
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "keyword" => Ok(Self::Keyword),
            "pattern" | "regex" => Ok(Self::Pattern),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classification rule as held by a rule source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Store id (None for rules that come from the rules file)
    pub id: Option<i64>,
    pub rule_type: RuleType,
    pub category: String,
    pub pattern: String,
    /// Confidence weight, 1-100
    pub weight: u32,
    /// Higher priority rules are listed first
    pub priority: i32,
    pub is_active: bool,
    pub comments: Option<String>,
}

impl ClassificationRule {
    pub fn new(
        rule_type: RuleType,
        category: &str,
        pattern: &str,
        weight: u32,
        priority: i32,
    ) -> Self {
        Self {
            id: None,
            rule_type,
            category: category.to_string(),
            pattern: pattern.to_string(),
            weight,
            priority,
            is_active: true,
            comments: None,
        }
    }
}

/// Outcome of testing a single rule against a sample string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTestResult {
    pub test_string: String,
    pub matches: bool,
    pub confidence: f64,
    pub rule_pattern: String,
    pub rule_type: RuleType,
}

/// A user-confirmed description recorded for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    /// Normalized description
    pub pattern: String,
    pub confidence: f64,
    pub count: u32,
}

/// Cache and configuration sizes of a classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherStatistics {
    pub exact_match_cache_size: usize,
    pub fuzzy_match_cache_size: usize,
    pub learned_patterns_count: usize,
    pub total_exact_matches: usize,
    pub total_keyword_categories: usize,
    pub total_pattern_categories: usize,
}
