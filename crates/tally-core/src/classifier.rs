//! Hybrid transaction classifier
//!
//! Four layers, tried from most to least specific:
//!
//! 1. **Exact**: normalized equality (100) or containment either way (95)
//!    against the exact-match table.
//! 2. **Fuzzy**: sequence similarity against the same table.
//! 3. **Keyword**: how many of a group's keywords appear in the description.
//! 4. **Pattern**: how many of a group's regexes match.
//!
//! An exact hit is returned immediately. Otherwise the first of the fuzzy,
//! keyword and pattern results that reaches its auto-accept threshold wins,
//! and failing that the most confident of them is returned for review.
//!
//! The classifier is owned by the caller and is `Send + Sync`; the exact and
//! fuzzy caches sit behind `RwLock`s.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{
    ClassificationSuggestion, FuzzyCandidate, LearnedPattern, MatchDetails, MatchMethod,
    MatchResult, MatcherStatistics,
};
use crate::rules::{ClassifierSettings, RuleSource, RulesConfig};
use crate::similarity;

/// Confidence of an exact equality hit
pub const EXACT_EQUAL_CONFIDENCE: f64 = 100.0;
/// Confidence of an exact containment hit
pub const EXACT_SUBSTRING_CONFIDENCE: f64 = 95.0;
/// Keyword scores never exceed this
pub const KEYWORD_CONFIDENCE_CAP: f64 = 95.0;
/// Pattern scores never exceed this
pub const PATTERN_CONFIDENCE_CAP: f64 = 90.0;
/// Non-automatic suggestions at or above this are worth a human look
pub const REVIEW_CONFIDENCE: f64 = 70.0;
/// Confidence recorded by [`HybridClassifier::learn_default`]
pub const DEFAULT_LEARN_CONFIDENCE: f64 = 90.0;

const KEYWORD_BONUS: f64 = 5.0;
const PATTERN_BONUS: f64 = 3.0;

/// Uppercase, trim and collapse whitespace runs; punctuation is kept
pub fn normalize(description: &str) -> String {
    description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

struct ExactEntry {
    pattern: String,
    category: String,
}

struct KeywordTable {
    key: String,
    category: String,
    weight: f64,
    /// (as configured, uppercased)
    keywords: Vec<(String, String)>,
}

struct PatternTable {
    key: String,
    category: String,
    weight: f64,
    patterns: Vec<(String, Regex)>,
}

type Cache = RwLock<HashMap<String, Option<MatchResult>>>;

/// Four-layer classifier over a rules configuration
pub struct HybridClassifier {
    settings: ClassifierSettings,
    exact: Vec<ExactEntry>,
    keywords: Vec<KeywordTable>,
    patterns: Vec<PatternTable>,
    exact_cache: Cache,
    fuzzy_cache: Cache,
    learned: Mutex<HashMap<String, Vec<LearnedPattern>>>,
}

impl HybridClassifier {
    pub fn new(config: RulesConfig) -> Self {
        let settings = config.settings();

        let exact = config
            .exact_matches
            .into_iter()
            .filter_map(|(pattern, category)| {
                let pattern = normalize(&pattern);
                (!pattern.is_empty()).then_some(ExactEntry { pattern, category })
            })
            .collect();

        let keywords = config
            .keyword_matches
            .iter()
            .map(|(key, group)| KeywordTable {
                key: key.clone(),
                category: group.category_or(key).to_string(),
                weight: group.weight as f64,
                keywords: group
                    .keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| (k.clone(), k.trim().to_uppercase()))
                    .collect(),
            })
            .collect();

        let patterns = config
            .pattern_matches
            .iter()
            .map(|(key, group)| PatternTable {
                key: key.clone(),
                category: group.category_or(key).to_string(),
                weight: group.weight as f64,
                patterns: group
                    .patterns
                    .iter()
                    .filter_map(|p| compile_pattern(key, p))
                    .collect(),
            })
            .collect();

        Self {
            settings,
            exact,
            keywords,
            patterns,
            exact_cache: RwLock::new(HashMap::new()),
            fuzzy_cache: RwLock::new(HashMap::new()),
            learned: Mutex::new(HashMap::new()),
        }
    }

    /// Build from any rule source, e.g. the SQLite rule store
    pub fn from_source(source: &dyn RuleSource, settings: ClassifierSettings) -> Result<Self> {
        RulesConfig::from_source(source, settings).map(Self::new)
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Layer 1: normalized equality, then containment in either direction
    pub fn exact_match(&self, description: &str) -> Option<MatchResult> {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return None;
        }
        cached(&self.exact_cache, &normalized, || self.find_exact(&normalized))
    }

    fn find_exact(&self, normalized: &str) -> Option<MatchResult> {
        if let Some(entry) = self.exact.iter().find(|e| e.pattern == normalized) {
            return Some(MatchResult {
                category: entry.category.clone(),
                confidence: EXACT_EQUAL_CONFIDENCE,
                method: MatchMethod::Exact,
                details: MatchDetails::ExactEqual {
                    description: normalized.to_string(),
                },
            });
        }

        self.exact
            .iter()
            .find(|e| normalized.contains(&e.pattern) || e.pattern.contains(normalized))
            .map(|entry| MatchResult {
                category: entry.category.clone(),
                confidence: EXACT_SUBSTRING_CONFIDENCE,
                method: MatchMethod::Exact,
                details: MatchDetails::ExactSubstring {
                    matched_pattern: entry.pattern.clone(),
                    description: normalized.to_string(),
                },
            })
    }

    /// Layer 2: best similarity against the exact-match patterns
    pub fn fuzzy_match(&self, description: &str) -> Option<MatchResult> {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return None;
        }
        cached(&self.fuzzy_cache, &normalized, || self.find_fuzzy(&normalized))
    }

    fn find_fuzzy(&self, normalized: &str) -> Option<MatchResult> {
        let min_similarity = self.settings.fuzzy_matching.min_similarity;

        let mut candidates: Vec<FuzzyCandidate> = self
            .exact
            .iter()
            .filter_map(|entry| {
                let similarity = similarity::ratio(normalized, &entry.pattern);
                (similarity > 0.0 && similarity >= min_similarity).then(|| FuzzyCandidate {
                    pattern: entry.pattern.clone(),
                    category: entry.category.clone(),
                    similarity,
                })
            })
            .collect();

        // Stable, so the first of equally similar patterns stays ahead
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        let best = candidates.first()?.clone();
        candidates.truncate(self.settings.fuzzy_matching.max_candidates.max(1));

        Some(MatchResult {
            category: best.category,
            confidence: best.similarity,
            method: MatchMethod::Fuzzy,
            details: MatchDetails::Fuzzy {
                matched_pattern: best.pattern,
                similarity: best.similarity,
                description: normalized.to_string(),
                candidates,
            },
        })
    }

    /// Layer 3: keyword groups, scored by how many keywords appear
    pub fn keyword_match(&self, description: &str) -> Option<MatchResult> {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<MatchResult> = None;
        for table in &self.keywords {
            let matched: Vec<String> = table
                .keywords
                .iter()
                .filter(|(_, upper)| normalized.contains(upper.as_str()))
                .map(|(original, _)| original.clone())
                .collect();
            if matched.is_empty() {
                continue;
            }

            let confidence =
                (table.weight + KEYWORD_BONUS * matched.len() as f64).min(KEYWORD_CONFIDENCE_CAP);
            if best.as_ref().map_or(true, |b| confidence > b.confidence) {
                best = Some(MatchResult {
                    category: table.category.clone(),
                    confidence,
                    method: MatchMethod::Keyword,
                    details: MatchDetails::Keyword {
                        matched_keywords: matched,
                        total_keywords: table.keywords.len(),
                        category: table.key.clone(),
                        description: normalized.clone(),
                    },
                });
            }
        }
        best
    }

    /// Layer 4: regex groups, scored by how many patterns match
    pub fn pattern_match(&self, description: &str) -> Option<MatchResult> {
        let normalized = normalize(description);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<MatchResult> = None;
        for table in &self.patterns {
            let matched: Vec<String> = table
                .patterns
                .iter()
                .filter(|(_, re)| re.is_match(&normalized))
                .map(|(source, _)| source.clone())
                .collect();
            if matched.is_empty() {
                continue;
            }

            let confidence =
                (table.weight + PATTERN_BONUS * matched.len() as f64).min(PATTERN_CONFIDENCE_CAP);
            if best.as_ref().map_or(true, |b| confidence > b.confidence) {
                best = Some(MatchResult {
                    category: table.category.clone(),
                    confidence,
                    method: MatchMethod::Pattern,
                    details: MatchDetails::Pattern {
                        matched_patterns: matched,
                        total_patterns: table.patterns.len(),
                        category: table.key.clone(),
                        description: normalized.clone(),
                    },
                });
            }
        }
        best
    }

    /// Classify one description
    pub fn classify(&self, description: &str) -> Option<MatchResult> {
        if normalize(description).is_empty() {
            return None;
        }

        if let Some(result) = self.exact_match(description) {
            debug!(
                "Exact match for '{}': {} ({:.1})",
                description, result.category, result.confidence
            );
            return Some(result);
        }

        let candidates: Vec<MatchResult> = [
            self.fuzzy_match(description),
            self.keyword_match(description),
            self.pattern_match(description),
        ]
        .into_iter()
        .flatten()
        .collect();

        if let Some(index) = candidates.iter().position(|r| self.should_auto_assign(r)) {
            return candidates.into_iter().nth(index);
        }

        let mut best: Option<MatchResult> = None;
        for candidate in candidates {
            if best.as_ref().map_or(true, |b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }
        if best.is_none() {
            debug!("No classification for '{}'", description);
        }
        best
    }

    /// Whether a result is confident enough to apply without review
    pub fn should_auto_assign(&self, result: &MatchResult) -> bool {
        let thresholds = &self.settings.confidence_thresholds;
        match result.method {
            MatchMethod::Exact => true,
            MatchMethod::Fuzzy => result.confidence >= thresholds.fuzzy_match_auto,
            MatchMethod::Keyword => result.confidence >= thresholds.keyword_match_auto,
            MatchMethod::Pattern => result.confidence >= thresholds.pattern_match_auto,
        }
    }

    /// Classify a batch of `(operation_id, description)` pairs
    ///
    /// Input order is kept; descriptions with no classification are left out.
    pub fn suggest<'a, I>(&self, operations: I) -> Vec<ClassificationSuggestion>
    where
        I: IntoIterator<Item = (i64, &'a str)>,
    {
        operations
            .into_iter()
            .filter_map(|(operation_id, description)| {
                let result = self.classify(description)?;
                let should_auto_assign = self.should_auto_assign(&result);
                Some(ClassificationSuggestion {
                    operation_id,
                    category: result.category,
                    confidence: result.confidence,
                    method: result.method,
                    details: result.details,
                    should_auto_assign,
                })
            })
            .collect()
    }

    /// Record a confirmed classification
    pub fn learn(&self, description: &str, category: &str, confidence: f64) {
        let learning = &self.settings.learning;
        if !learning.track_success || confidence < learning.min_confidence_for_learning {
            return;
        }

        let mut learned = self.learned.lock().unwrap_or_else(PoisonError::into_inner);
        let patterns = learned.entry(category.to_string()).or_default();
        patterns.push(LearnedPattern {
            pattern: normalize(description),
            confidence,
            count: 1,
        });

        if patterns.len() > learning.max_learned_patterns {
            patterns.sort_by(|a, b| {
                b.confidence
                    .total_cmp(&a.confidence)
                    .then_with(|| b.count.cmp(&a.count))
            });
            patterns.truncate(learning.max_learned_patterns);
        }
        debug!("Learned '{}' as {}", description, category);
    }

    pub fn learn_default(&self, description: &str, category: &str) {
        self.learn(description, category, DEFAULT_LEARN_CONFIDENCE);
    }

    /// Snapshot of learned patterns per category
    pub fn learned_patterns(&self) -> HashMap<String, Vec<LearnedPattern>> {
        self.learned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_caches(&self) {
        self.exact_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fuzzy_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("Classifier caches cleared");
    }

    pub fn statistics(&self) -> MatcherStatistics {
        let read_len = |cache: &Cache| cache.read().unwrap_or_else(PoisonError::into_inner).len();
        let learned_patterns_count = self
            .learned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum();

        MatcherStatistics {
            exact_match_cache_size: read_len(&self.exact_cache),
            fuzzy_match_cache_size: read_len(&self.fuzzy_cache),
            learned_patterns_count,
            total_exact_matches: self.exact.len(),
            total_keyword_categories: self.keywords.len(),
            total_pattern_categories: self.patterns.len(),
        }
    }
}

/// Keep only the suggestions that can be applied automatically
pub fn high_confidence(suggestions: &[ClassificationSuggestion]) -> Vec<ClassificationSuggestion> {
    suggestions
        .iter()
        .filter(|s| s.should_auto_assign)
        .cloned()
        .collect()
}

/// Suggestions that are not automatic but still worth reviewing
pub fn needs_review(suggestions: &[ClassificationSuggestion]) -> Vec<ClassificationSuggestion> {
    suggestions
        .iter()
        .filter(|s| !s.should_auto_assign && s.confidence >= REVIEW_CONFIDENCE)
        .cloned()
        .collect()
}

fn compile_pattern(group: &str, pattern: &str) -> Option<(String, Regex)> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some((pattern.to_string(), re)),
        Err(e) => {
            warn!("Skipping invalid pattern '{}' in group {}: {}", pattern, group, e);
            None
        }
    }
}

fn cached<F>(cache: &Cache, key: &str, compute: F) -> Option<MatchResult>
where
    F: FnOnce() -> Option<MatchResult>,
{
    if let Some(hit) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
    {
        return hit.clone();
    }

    let result = compute();
    cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key.to_string(), result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
exact_matches:
  AGROBAZAR: Food
  FARMACIA FAMILIEI: Healthcare
keyword_matches:
  groceries:
    keywords: [MARKET, SUPERMARKET, MAGAZIN]
    weight: 80
    type: Food
  fuel:
    keywords: [PETROM, ROMPETROL]
    weight: 70
  misc:
    keywords: [SERVICII]
    weight: 50
pattern_matches:
  transport:
    patterns: ['^BOLT', 'TAXI\s+\d+', '(']
    weight: 70
    type: Transport
"#;

    fn classifier() -> HybridClassifier {
        HybridClassifier::new(RulesConfig::from_yaml_str(RULES).unwrap())
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  agro   bazar\t02 "), "AGRO BAZAR 02");
        assert_eq!(normalize("s.r.l. x"), "S.R.L. X");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_exact_equality() {
        let result = classifier().classify("agrobazar").unwrap();
        assert_eq!(result.category, "Food");
        assert_eq!(result.confidence, 100.0);
        assert_eq!(result.method, MatchMethod::Exact);
        assert!(matches!(result.details, MatchDetails::ExactEqual { .. }));
    }

    #[test]
    fn test_exact_containment() {
        let result = classifier().classify("AGROBAZAR SHOP 02").unwrap();
        assert_eq!(result.category, "Food");
        assert_eq!(result.confidence, 95.0);
        match result.details {
            MatchDetails::ExactSubstring {
                matched_pattern, ..
            } => assert_eq!(matched_pattern, "AGROBAZAR"),
            other => panic!("unexpected details: {:?}", other),
        }

        // Description inside the pattern counts too
        let result = classifier().exact_match("FARMACIA").unwrap();
        assert_eq!(result.category, "Healthcare");
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn test_unknown_merchant() {
        let c = classifier();
        assert!(c.classify("UNKNOWN MERCHANT").is_none());
        assert!(c.classify("").is_none());
        assert!(c.classify("   ").is_none());
    }

    #[test]
    fn test_keyword_aggregation_is_capped() {
        let result = classifier().classify("SUPERMARKET MAGAZIN").unwrap();
        assert_eq!(result.method, MatchMethod::Keyword);
        assert_eq!(result.category, "Food");
        // 80 + 3 * 5, capped
        assert_eq!(result.confidence, 95.0);
        match result.details {
            MatchDetails::Keyword {
                matched_keywords,
                total_keywords,
                category,
                ..
            } => {
                assert_eq!(matched_keywords.len(), 3);
                assert_eq!(total_keywords, 3);
                assert_eq!(category, "groceries");
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_group_key_is_category_without_type() {
        let result = classifier().keyword_match("PETROM STATIA 4").unwrap();
        assert_eq!(result.category, "fuel");
        assert_eq!(result.confidence, 75.0);
    }

    #[test]
    fn test_pattern_layer_skips_invalid_regex() {
        let c = classifier();
        let result = c.pattern_match("bolt taxi 12").unwrap();
        assert_eq!(result.category, "Transport");
        assert_eq!(result.confidence, 76.0);
        match result.details {
            MatchDetails::Pattern { total_patterns, .. } => assert_eq!(total_patterns, 2),
            other => panic!("unexpected details: {:?}", other),
        }

        // 73 is below the pattern threshold but still the best candidate
        let result = c.classify("BOLT RIDE").unwrap();
        assert_eq!(result.method, MatchMethod::Pattern);
        assert!(!c.should_auto_assign(&result));
    }

    #[test]
    fn test_auto_layer_wins_over_later_layers() {
        // Keyword (85) clears its threshold before the pattern layer is considered
        let result = classifier().classify("BOLT MARKET").unwrap();
        assert_eq!(result.method, MatchMethod::Keyword);
        assert_eq!(result.confidence, 85.0);
    }

    #[test]
    fn test_fuzzy_below_auto_falls_back_to_best() {
        let c = classifier();
        let result = c.classify("FARMACIE FAMILIEI").unwrap();
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert_eq!(result.category, "Healthcare");
        assert!((result.confidence - 200.0 * 16.0 / 34.0).abs() < 1e-9);
        assert!(!c.should_auto_assign(&result));
        match result.details {
            MatchDetails::Fuzzy { candidates, .. } => {
                assert_eq!(candidates.len(), 1);
                assert_eq!(candidates[0].pattern, "FARMACIA FAMILIEI");
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_fuzzy_thresholds_are_inclusive() {
        let yaml = r#"
confidence_thresholds:
  fuzzy_match_auto: 90
fuzzy_matching:
  min_similarity: 90
exact_matches:
  AGROBAZARX: Food
"#;
        let c = HybridClassifier::new(RulesConfig::from_yaml_str(yaml).unwrap());
        let result = c.classify("AGROBAZARY").unwrap();
        assert_eq!(result.confidence, 90.0);
        assert!(c.should_auto_assign(&result));

        let mut config = RulesConfig::from_yaml_str(yaml).unwrap();
        config.confidence_thresholds.fuzzy_match_auto = 91.0;
        let below = HybridClassifier::new(config);
        let result = below.classify("AGROBAZARY").unwrap();
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert!(!below.should_auto_assign(&result));

        let mut config = RulesConfig::from_yaml_str(yaml).unwrap();
        config.fuzzy_matching.min_similarity = 90.5;
        let strict = HybridClassifier::new(config);
        assert!(strict.classify("AGROBAZARY").is_none());
    }

    #[test]
    fn test_fuzzy_needs_some_similarity() {
        let mut config =
            RulesConfig::from_yaml_str("exact_matches:\n  AGROBAZAR: Food\n").unwrap();
        config.fuzzy_matching.min_similarity = 0.0;
        let c = HybridClassifier::new(config);

        assert!(c.fuzzy_match("QQQ 111").is_none());
        assert!(c.classify("QQQ 111").is_none());

        let partial = c.fuzzy_match("BAZ").unwrap();
        assert_eq!(partial.confidence, 50.0);
    }

    #[test]
    fn test_two_keywords_reach_the_cap() {
        let yaml = r#"
keyword_matches:
  food:
    keywords: [AGRO, MARKET]
    weight: 90
"#;
        let c = HybridClassifier::new(RulesConfig::from_yaml_str(yaml).unwrap());
        let result = c.classify("AGRO MARKET SUPPLY").unwrap();
        assert_eq!(result.category, "food");
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn test_classify_is_idempotent_and_cached() {
        let c = classifier();
        let first = c.classify("UNKNOWN MERCHANT");
        let second = c.classify("unknown   merchant");
        assert_eq!(first, second);

        let stats = c.statistics();
        assert_eq!(stats.exact_match_cache_size, 1);
        assert_eq!(stats.fuzzy_match_cache_size, 1);

        c.clear_caches();
        let stats = c.statistics();
        assert_eq!(stats.exact_match_cache_size, 0);
        assert_eq!(stats.fuzzy_match_cache_size, 0);
        assert_eq!(c.classify("UNKNOWN MERCHANT"), first);
    }

    #[test]
    fn test_suggest_keeps_order_and_omits_misses() {
        let c = classifier();
        let suggestions = c.suggest(vec![
            (1, "AGROBAZAR"),
            (2, "UNKNOWN MERCHANT"),
            (3, "PETROM 12"),
            (4, "SERVICII COMUNALE"),
        ]);
        let ids: Vec<i64> = suggestions.iter().map(|s| s.operation_id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert!(suggestions[0].should_auto_assign);
        assert!(!suggestions[1].should_auto_assign);

        let auto = high_confidence(&suggestions);
        assert_eq!(auto.len(), 1);
        assert_eq!(auto[0].operation_id, 1);

        // PETROM at 75 needs review, SERVICII at 55 is too weak
        let review = needs_review(&suggestions);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].operation_id, 3);
    }

    #[test]
    fn test_learning_disabled_by_default() {
        let c = classifier();
        c.learn("AGROBAZAR 02", "Food", 99.0);
        assert!(c.learned_patterns().is_empty());
    }

    #[test]
    fn test_learning_keeps_best_patterns() {
        let mut config = RulesConfig::from_yaml_str(RULES).unwrap();
        config.learning.track_success = true;
        config.learning.max_learned_patterns = 2;
        let c = HybridClassifier::new(config);

        c.learn("shop one", "Food", 80.0);
        c.learn("shop two", "Food", 95.0);
        c.learn("shop three", "Food", 60.0);
        c.learn_default("shop four", "Food");

        let learned = c.learned_patterns();
        let food = &learned["Food"];
        assert_eq!(food.len(), 2);
        assert_eq!(food[0].pattern, "SHOP TWO");
        assert_eq!(food[1].pattern, "SHOP FOUR");
        assert_eq!(food[1].count, 1);
        assert_eq!(c.statistics().learned_patterns_count, 2);

        // Learned patterns do not change classification
        assert!(c.classify("SHOP TWO").is_none());
    }

    #[test]
    fn test_statistics_counts_tables() {
        let stats = classifier().statistics();
        assert_eq!(stats.total_exact_matches, 2);
        assert_eq!(stats.total_keyword_categories, 3);
        assert_eq!(stats.total_pattern_categories, 1);
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HybridClassifier>();

        let c = classifier();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    assert_eq!(c.classify("AGROBAZAR").unwrap().confidence, 100.0);
                    assert!(c.classify("NOTHING HERE").is_none());
                });
            }
        });
        assert_eq!(c.statistics().exact_match_cache_size, 2);
    }
}
