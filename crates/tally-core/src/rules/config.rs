//! Declarative rules file (`operations_matching.yaml`)
//!
//! The file maps exact merchant strings to categories and groups keywords and
//! regexes under weighted categories:
//!
//! ```yaml
//! confidence_thresholds:
//!   exact_match: 100
//!   fuzzy_match_auto: 95
//!   keyword_match_auto: 80
//!   pattern_match_auto: 75
//! fuzzy_matching:
//!   min_similarity: 85
//!   max_candidates: 5
//! exact_matches:
//!   AGROBAZAR: Food
//! keyword_matches:
//!   food:
//!     keywords: [AGRO, MARKET]
//!     weight: 90
//!     type: Food
//! pattern_matches:
//!   food_patterns:
//!     patterns: [".*AGRO.*"]
//!     weight: 75
//!     type: Food
//! learning:
//!   track_success: true
//!   min_confidence_for_learning: 70
//!   max_learned_patterns: 1000
//! ```
//!
//! Every section is optional. Mapping order is preserved because earlier
//! entries win ties.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ClassificationRule, RuleType};

use super::RuleSource;

/// Default rules file name
pub const RULES_FILE_NAME: &str = "operations_matching.yaml";

pub const DEFAULT_KEYWORD_WEIGHT: u32 = 70;
pub const DEFAULT_PATTERN_WEIGHT: u32 = 60;

/// Priorities given to rules derived from the rules file
pub const EXACT_RULE_PRIORITY: i32 = 100;
pub const KEYWORD_RULE_PRIORITY: i32 = 50;
pub const PATTERN_RULE_PRIORITY: i32 = 25;

/// Comment prefixes recording the group an imported rule came from
const KEYWORD_GROUP_TAG: &str = "keyword group ";
const PATTERN_GROUP_TAG: &str = "pattern group ";

/// Auto-accept thresholds per layer (0-100, inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub exact_match: f64,
    pub fuzzy_match_auto: f64,
    pub keyword_match_auto: f64,
    pub pattern_match_auto: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            exact_match: 100.0,
            fuzzy_match_auto: 95.0,
            keyword_match_auto: 80.0,
            pattern_match_auto: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzySettings {
    /// Minimum similarity (0-100) for a fuzzy match
    pub min_similarity: f64,
    /// Runner-up candidates kept in match details
    pub max_candidates: usize,
}

impl Default for FuzzySettings {
    fn default() -> Self {
        Self {
            min_similarity: 85.0,
            max_candidates: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningSettings {
    pub track_success: bool,
    pub min_confidence_for_learning: f64,
    /// Per category
    pub max_learned_patterns: usize,
}

impl Default for LearningSettings {
    fn default() -> Self {
        Self {
            track_success: false,
            min_confidence_for_learning: 70.0,
            max_learned_patterns: 1000,
        }
    }
}

/// The non-rule part of a configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifierSettings {
    pub confidence_thresholds: ConfidenceThresholds,
    pub fuzzy_matching: FuzzySettings,
    pub learning: LearningSettings,
}

/// A keyword group: any contained keyword counts toward the group's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordGroup {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_keyword_weight")]
    pub weight: u32,
    /// Category assigned on match; the group key when absent
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A regex group: each matching pattern counts toward the group's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternGroup {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_pattern_weight")]
    pub weight: u32,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn default_keyword_weight() -> u32 {
    DEFAULT_KEYWORD_WEIGHT
}

fn default_pattern_weight() -> u32 {
    DEFAULT_PATTERN_WEIGHT
}

impl KeywordGroup {
    pub fn category_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.category.as_deref().unwrap_or(key)
    }
}

impl PatternGroup {
    pub fn category_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.category.as_deref().unwrap_or(key)
    }
}

/// Parsed rules file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub confidence_thresholds: ConfidenceThresholds,
    #[serde(default)]
    pub fuzzy_matching: FuzzySettings,
    /// Pattern → category, in file order
    #[serde(default, with = "ordered_map")]
    pub exact_matches: Vec<(String, String)>,
    #[serde(default, with = "ordered_map")]
    pub keyword_matches: Vec<(String, KeywordGroup)>,
    #[serde(default, with = "ordered_map")]
    pub pattern_matches: Vec<(String, PatternGroup)>,
    #[serde(default)]
    pub learning: LearningSettings,
}

impl RulesConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a rules file that must exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigurationNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents)?;
        debug!(
            "Loaded rules from {}: {} exact, {} keyword groups, {} pattern groups",
            path.display(),
            config.exact_matches.len(),
            config.keyword_matches.len(),
            config.pattern_matches.len()
        );
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            confidence_thresholds: self.confidence_thresholds.clone(),
            fuzzy_matching: self.fuzzy_matching.clone(),
            learning: self.learning.clone(),
        }
    }

    /// Build classifier tables from a flat rule list
    ///
    /// Exact rules keep their order. Keyword and pattern rules imported from a
    /// rules file are regrouped under the group key recorded in their comments.
    /// Rules added by hand are grouped by (category, weight). Groups keep their
    /// first-appearance order. Inactive rules are ignored.
    pub fn from_rules(rules: &[ClassificationRule], settings: ClassifierSettings) -> Self {
        let mut config = Self {
            confidence_thresholds: settings.confidence_thresholds,
            fuzzy_matching: settings.fuzzy_matching,
            learning: settings.learning,
            ..Default::default()
        };

        let mut keyword_groups: Vec<RuleGroup> = Vec::new();
        let mut pattern_groups: Vec<RuleGroup> = Vec::new();

        for rule in rules.iter().filter(|r| r.is_active) {
            match rule.rule_type {
                RuleType::Exact => config
                    .exact_matches
                    .push((rule.pattern.clone(), rule.category.clone())),
                RuleType::Keyword => push_grouped(&mut keyword_groups, rule, KEYWORD_GROUP_TAG),
                RuleType::Pattern => push_grouped(&mut pattern_groups, rule, PATTERN_GROUP_TAG),
            }
        }

        config.keyword_matches = keyed(keyword_groups)
            .map(|(key, group)| {
                (
                    key,
                    KeywordGroup {
                        keywords: group.members,
                        weight: group.weight,
                        category: Some(group.category),
                    },
                )
            })
            .collect();

        config.pattern_matches = keyed(pattern_groups)
            .map(|(key, group)| {
                (
                    key,
                    PatternGroup {
                        patterns: group.members,
                        weight: group.weight,
                        category: Some(group.category),
                    },
                )
            })
            .collect();

        config
    }

    /// Build classifier tables from any rule source
    pub fn from_source(source: &dyn RuleSource, settings: ClassifierSettings) -> Result<Self> {
        let rules = source.list_active_rules()?;
        Ok(Self::from_rules(&rules, settings))
    }

    /// Flatten into individual rules, unsorted
    pub(crate) fn to_rules(&self) -> Vec<ClassificationRule> {
        let mut rules = Vec::new();
        for (pattern, category) in &self.exact_matches {
            rules.push(ClassificationRule::new(
                RuleType::Exact,
                category,
                pattern,
                100,
                EXACT_RULE_PRIORITY,
            ));
        }
        for (key, group) in &self.keyword_matches {
            for keyword in &group.keywords {
                let mut rule = ClassificationRule::new(
                    RuleType::Keyword,
                    group.category_or(key),
                    keyword,
                    group.weight,
                    KEYWORD_RULE_PRIORITY,
                );
                rule.comments = Some(format!("{}{}", KEYWORD_GROUP_TAG, key));
                rules.push(rule);
            }
        }
        for (key, group) in &self.pattern_matches {
            for pattern in &group.patterns {
                let mut rule = ClassificationRule::new(
                    RuleType::Pattern,
                    group.category_or(key),
                    pattern,
                    group.weight,
                    PATTERN_RULE_PRIORITY,
                );
                rule.comments = Some(format!("{}{}", PATTERN_GROUP_TAG, key));
                rules.push(rule);
            }
        }
        rules
    }
}

impl RuleSource for RulesConfig {
    fn list_active_rules(&self) -> Result<Vec<ClassificationRule>> {
        let mut rules = self.to_rules();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.weight.cmp(&a.weight))
        });
        Ok(rules)
    }
}

/// Keyword or pattern rules that classify as one group
struct RuleGroup {
    /// Group key recorded when the rule was imported from a rules file
    recorded: Option<String>,
    category: String,
    weight: u32,
    members: Vec<String>,
}

fn push_grouped(groups: &mut Vec<RuleGroup>, rule: &ClassificationRule, tag: &str) {
    let recorded = rule
        .comments
        .as_deref()
        .and_then(|c| c.strip_prefix(tag))
        .filter(|key| !key.is_empty());

    let existing = groups.iter_mut().find(|g| {
        g.recorded.as_deref() == recorded && g.category == rule.category && g.weight == rule.weight
    });
    match existing {
        Some(group) => group.members.push(rule.pattern.clone()),
        None => groups.push(RuleGroup {
            recorded: recorded.map(str::to_string),
            category: rule.category.clone(),
            weight: rule.weight,
            members: vec![rule.pattern.clone()],
        }),
    }
}

/// Pair each group with a unique key
///
/// A recorded key is kept. Otherwise the key is the category, suffixed with the
/// weight when the category has several groups. Clashes get a numeric suffix.
fn keyed(groups: Vec<RuleGroup>) -> impl Iterator<Item = (String, RuleGroup)> {
    let mut used: Vec<String> = Vec::new();
    let keys: Vec<String> = groups
        .iter()
        .map(|group| {
            let base = match &group.recorded {
                Some(key) => key.clone(),
                None => {
                    let shared = groups
                        .iter()
                        .filter(|g| g.recorded.is_none() && g.category == group.category)
                        .count()
                        > 1;
                    if shared {
                        format!("{}_{}", group.category, group.weight)
                    } else {
                        group.category.clone()
                    }
                }
            };
            let mut key = base.clone();
            let mut n = 2;
            while used.contains(&key) {
                key = format!("{}_{}", base, n);
                n += 1;
            }
            used.push(key.clone());
            key
        })
        .collect();
    keys.into_iter().zip(groups)
}

/// Find the rules file
///
/// An explicit path must exist. Otherwise `./config/operations_matching.yaml`
/// is tried, then `<config dir>/tally/operations_matching.yaml`.
pub fn find_rules_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::ConfigurationNotFound(path.to_path_buf()));
    }

    let local = Path::new("config").join(RULES_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("tally").join(RULES_FILE_NAME);
        if user.exists() {
            return Ok(user);
        }
    }

    Err(Error::ConfigurationNotFound(local))
}

/// (De)serialize a YAML mapping as an ordered list of entries
mod ordered_map {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{SerializeMap, Serializer};
    use serde::Serialize;
    use std::fmt;
    use std::marker::PhantomData;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        deserializer.deserialize_any(EntriesVisitor(PhantomData))
    }

    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
confidence_thresholds:
  exact_match: 100
  fuzzy_match_auto: 95
  fuzzy_match_suggest: 85
  keyword_match_auto: 80
  pattern_match_auto: 75
fuzzy_matching:
  min_similarity: 85
  max_candidates: 5
exact_matches:
  RESTAURANT JERAFFE: Restaurant
  AGROBAZAR: Food
  FARMACIA FAMILIEI: Healthcare
keyword_matches:
  healthcare:
    keywords: [FARMACIA, APOTECA]
    weight: 85
    type: Healthcare
  food:
    keywords: [AGRO, MARKET]
pattern_matches:
  food_patterns:
    patterns: [".*AGRO.*"]
    weight: 75
    type: Food
learning:
  track_success: true
  min_confidence_for_learning: 70
  max_learned_patterns: 1000
"#;

    #[test]
    fn test_parse_preserves_order_and_defaults() {
        let config = RulesConfig::from_yaml_str(SAMPLE).unwrap();
        let exact: Vec<_> = config.exact_matches.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(exact, vec!["RESTAURANT JERAFFE", "AGROBAZAR", "FARMACIA FAMILIEI"]);
        assert_eq!(config.keyword_matches[0].0, "healthcare");

        let (key, food) = &config.keyword_matches[1];
        assert_eq!(food.weight, DEFAULT_KEYWORD_WEIGHT);
        assert_eq!(food.category_or(key), "food");
        assert_eq!(config.confidence_thresholds.keyword_match_auto, 80.0);
        assert!(config.learning.track_success);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = RulesConfig::from_yaml_str("exact_matches:\n  SHOP: Other\n").unwrap();
        assert_eq!(config.confidence_thresholds, ConfidenceThresholds::default());
        assert_eq!(config.fuzzy_matching.min_similarity, 85.0);
        assert!(config.keyword_matches.is_empty());
        assert!(!config.learning.track_success);

        let config = RulesConfig::from_yaml_str("exact_matches:\nkeyword_matches:\n").unwrap();
        assert!(config.exact_matches.is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let err = RulesConfig::from_yaml_str("exact_matches: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RulesConfig::load("/no/such/rules.yaml").unwrap_err();
        assert!(matches!(err, Error::ConfigurationNotFound(_)));
    }

    #[test]
    fn test_load_and_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RULES_FILE_NAME);
        std::fs::write(&path, SAMPLE).unwrap();

        let config = RulesConfig::load(&path).unwrap();
        let reparsed = RulesConfig::from_yaml_str(&config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_explicit_rules_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            find_rules_file(Some(missing.as_path())),
            Err(Error::ConfigurationNotFound(_))
        ));

        let present = dir.path().join("rules.yaml");
        std::fs::write(&present, "{}").unwrap();
        assert_eq!(find_rules_file(Some(present.as_path())).unwrap(), present);
    }

    #[test]
    fn test_rules_listed_by_priority_then_weight() {
        let config = RulesConfig::from_yaml_str(SAMPLE).unwrap();
        let rules = config.list_active_rules().unwrap();
        assert_eq!(rules.len(), 3 + 4 + 1);
        assert!(rules[..3].iter().all(|r| r.rule_type == RuleType::Exact));
        assert_eq!(rules[0].pattern, "RESTAURANT JERAFFE");
        // healthcare (85) before food (default 70)
        assert_eq!(rules[3].pattern, "FARMACIA");
        assert_eq!(rules[3].category, "Healthcare");
        assert_eq!(rules[5].category, "food");
        assert_eq!(rules[7].rule_type, RuleType::Pattern);
        assert_eq!(rules[7].priority, PATTERN_RULE_PRIORITY);
    }

    #[test]
    fn test_from_rules_groups_by_category_and_weight() {
        let rules = vec![
            ClassificationRule::new(RuleType::Keyword, "Food", "AGRO", 90, 50),
            ClassificationRule::new(RuleType::Keyword, "Health", "FARMACIA", 85, 50),
            ClassificationRule::new(RuleType::Keyword, "Food", "MARKET", 90, 50),
            ClassificationRule::new(RuleType::Keyword, "Food", "BAKERY", 70, 50),
            ClassificationRule::new(RuleType::Exact, "Food", "AGROBAZAR", 100, 100),
        ];
        let config = RulesConfig::from_rules(&rules, ClassifierSettings::default());

        assert_eq!(config.exact_matches, vec![("AGROBAZAR".to_string(), "Food".to_string())]);
        assert_eq!(config.keyword_matches.len(), 3);
        let (key, group) = &config.keyword_matches[0];
        assert_eq!(key, "Food_90");
        assert_eq!(group.keywords, vec!["AGRO", "MARKET"]);
        assert_eq!(config.keyword_matches[1].0, "Health");
        assert_eq!(config.keyword_matches[2].1.weight, 70);
    }

    #[test]
    fn test_from_rules_regroups_by_recorded_key() {
        let tagged = |pattern: &str, key: &str| {
            let mut rule = ClassificationRule::new(RuleType::Keyword, "Food", pattern, 80, 50);
            rule.comments = Some(format!("keyword group {}", key));
            rule
        };
        let rules = vec![
            tagged("MARKET", "groceries"),
            tagged("AGRO", "farmers"),
            tagged("SUPERMARKET", "groceries"),
            // Added by hand: same category and weight, no recorded key
            ClassificationRule::new(RuleType::Keyword, "Food", "BAKERY", 80, 50),
        ];
        let config = RulesConfig::from_rules(&rules, ClassifierSettings::default());

        let keys: Vec<&str> = config.keyword_matches.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["groceries", "farmers", "Food"]);
        assert_eq!(config.keyword_matches[0].1.keywords, vec!["MARKET", "SUPERMARKET"]);
        assert_eq!(config.keyword_matches[1].1.keywords, vec!["AGRO"]);
        assert_eq!(config.keyword_matches[2].1.category.as_deref(), Some("Food"));
    }

    #[test]
    fn test_from_rules_group_keys_are_unique() {
        let mut tagged = ClassificationRule::new(RuleType::Keyword, "Food", "MARKET", 80, 50);
        tagged.comments = Some("keyword group Food".into());
        let rules = vec![
            tagged,
            ClassificationRule::new(RuleType::Keyword, "Food", "BAKERY", 70, 50),
        ];
        let config = RulesConfig::from_rules(&rules, ClassifierSettings::default());

        let keys: Vec<&str> = config.keyword_matches.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Food", "Food_2"]);
        let reparsed = RulesConfig::from_yaml_str(&config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(reparsed.keyword_matches.len(), 2);
    }

    #[test]
    fn test_from_rules_skips_inactive() {
        let mut rule = ClassificationRule::new(RuleType::Exact, "Food", "AGROBAZAR", 100, 100);
        rule.is_active = false;
        let config = RulesConfig::from_rules(&[rule], ClassifierSettings::default());
        assert!(config.exact_matches.is_empty());
    }
}
