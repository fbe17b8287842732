//! SQLite-backed classification rule store with connection pooling

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{ClassificationRule, RuleType};

use super::{RuleSource, RulesConfig};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

const RULE_COLUMNS: &str =
    "id, rule_type, category, pattern, weight, priority, is_active, comments";

/// Filter for [`SqliteRuleStore::list_rules`]
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    pub rule_type: Option<RuleType>,
    pub category: Option<String>,
    pub active_only: bool,
}

impl RuleFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }
}

/// Usage counters for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStats {
    pub rule_id: i64,
    pub usage_count: i64,
    pub success_count: i64,
    /// Percentage of uses that were successful, 0 when unused
    pub success_rate: f64,
    pub last_used: Option<String>,
}

/// Mutable rule store
#[derive(Clone, Debug)]
pub struct SqliteRuleStore {
    pool: DbPool,
}

impl SqliteRuleStore {
    /// Open (or create) a rule database file
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    /// Private in-memory store (for tests and one-off imports)
    ///
    /// A single pooled connection, since every `:memory:` connection is its
    /// own database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matching_rules (
                id INTEGER PRIMARY KEY,
                rule_type TEXT NOT NULL CHECK (rule_type IN ('exact', 'keyword', 'pattern')),
                category TEXT NOT NULL,
                pattern TEXT NOT NULL,
                weight INTEGER NOT NULL DEFAULT 85,
                priority INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                comments TEXT,
                created_by TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                usage_count INTEGER NOT NULL DEFAULT 0,
                success_count INTEGER NOT NULL DEFAULT 0,
                last_used DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_matching_rules_type ON matching_rules(rule_type);
            CREATE INDEX IF NOT EXISTS idx_matching_rules_category ON matching_rules(category);
            CREATE INDEX IF NOT EXISTS idx_matching_rules_active ON matching_rules(is_active);
            CREATE INDEX IF NOT EXISTS idx_matching_rules_priority ON matching_rules(priority);
            "#,
        )?;
        Ok(())
    }

    fn row_to_rule(row: &Row) -> rusqlite::Result<ClassificationRule> {
        let rule_type: String = row.get(1)?;
        Ok(ClassificationRule {
            id: Some(row.get(0)?),
            rule_type: rule_type.parse().unwrap_or(RuleType::Keyword),
            category: row.get(2)?,
            pattern: row.get(3)?,
            weight: row.get(4)?,
            priority: row.get(5)?,
            is_active: row.get(6)?,
            comments: row.get(7)?,
        })
    }

    /// Insert a validated rule and return its id
    pub fn insert_rule(&self, rule: &ClassificationRule) -> Result<i64> {
        rule.validate()?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO matching_rules (rule_type, category, pattern, weight, priority, is_active, comments)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                rule.rule_type.as_str(),
                rule.category,
                rule.pattern,
                rule.weight,
                rule.priority,
                rule.is_active,
                rule.comments
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_rule(&self, id: i64) -> Result<Option<ClassificationRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!("SELECT {} FROM matching_rules WHERE id = ?", RULE_COLUMNS),
                params![id],
                Self::row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// Replace every editable field of a stored rule
    pub fn update_rule(&self, rule: &ClassificationRule) -> Result<()> {
        let id = rule
            .id
            .ok_or_else(|| Error::InvalidRule("rule has no id".to_string()))?;
        rule.validate()?;
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE matching_rules
            SET rule_type = ?, category = ?, pattern = ?, weight = ?, priority = ?,
                is_active = ?, comments = ?, updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                rule.rule_type.as_str(),
                rule.category,
                rule.pattern,
                rule.weight,
                rule.priority,
                rule.is_active,
                rule.comments,
                id
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("rule {}", id)));
        }
        Ok(())
    }

    pub fn set_active(&self, id: i64, active: bool) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE matching_rules SET is_active = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![active, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("rule {}", id)));
        }
        Ok(())
    }

    /// Apply several priority changes at once; returns how many rules changed
    pub fn set_priorities(&self, updates: &[(i64, i32)]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut updated = 0;
        for (id, priority) in updates {
            updated += tx.execute(
                "UPDATE matching_rules SET priority = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                params![priority, id],
            )?;
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a rule; returns false if it did not exist
    pub fn delete_rule(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM matching_rules WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// List rules by priority, then weight (both descending)
    pub fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<ClassificationRule>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM matching_rules WHERE 1=1", RULE_COLUMNS);
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(rule_type) = filter.rule_type {
            sql.push_str(" AND rule_type = ?");
            params_vec.push(Box::new(rule_type.as_str().to_string()));
        }

        if let Some(ref category) = filter.category {
            sql.push_str(" AND category = ?");
            params_vec.push(Box::new(category.clone()));
        }

        if filter.active_only {
            sql.push_str(" AND is_active = 1");
        }

        sql.push_str(" ORDER BY priority DESC, weight DESC, id");

        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rules = stmt
            .query_map(params_refs.as_slice(), Self::row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Distinct categories of active rules, alphabetically
    pub fn categories(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM matching_rules WHERE is_active = 1 ORDER BY category",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    /// Copy every rule of a rules file into the store
    ///
    /// Exact rules get weight 100 and priority 100, keyword rules priority 50
    /// and pattern rules priority 25. Rules that fail validation are skipped.
    /// Returns the number of rules inserted.
    pub fn import_config(&self, config: &RulesConfig) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        let mut skipped = 0;

        for rule in config.to_rules() {
            if let Err(e) = rule.validate() {
                tracing::warn!("Skipping rule {:?}: {}", rule.pattern, e);
                skipped += 1;
                continue;
            }
            tx.execute(
                r#"
                INSERT INTO matching_rules
                    (rule_type, category, pattern, weight, priority, is_active, comments, created_by)
                VALUES (?, ?, ?, ?, ?, 1, ?, 'migration')
                "#,
                params![
                    rule.rule_type.as_str(),
                    rule.category,
                    rule.pattern,
                    rule.weight,
                    rule.priority,
                    rule.comments
                ],
            )?;
            inserted += 1;
        }

        tx.commit()?;
        info!(
            "Imported {} rules into the rule store ({} skipped)",
            inserted, skipped
        );
        Ok(inserted)
    }

    /// Count one use of a rule
    pub fn record_match(&self, rule_id: i64, success: bool) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE matching_rules
            SET usage_count = usage_count + 1,
                success_count = success_count + ?,
                last_used = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![success as i64, rule_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("rule {}", rule_id)));
        }
        Ok(())
    }

    pub fn rule_stats(&self, rule_id: i64) -> Result<RuleStats> {
        let conn = self.conn()?;
        let stats = conn
            .query_row(
                "SELECT usage_count, success_count, last_used FROM matching_rules WHERE id = ?",
                params![rule_id],
                |row| {
                    let usage_count: i64 = row.get(0)?;
                    let success_count: i64 = row.get(1)?;
                    let success_rate = if usage_count > 0 {
                        (success_count as f64 / usage_count as f64 * 10000.0).round() / 100.0
                    } else {
                        0.0
                    };
                    Ok(RuleStats {
                        rule_id,
                        usage_count,
                        success_count,
                        success_rate,
                        last_used: row.get(2)?,
                    })
                },
            )
            .optional()?;
        stats.ok_or_else(|| Error::NotFound(format!("rule {}", rule_id)))
    }
}

impl RuleSource for SqliteRuleStore {
    fn list_active_rules(&self) -> Result<Vec<ClassificationRule>> {
        self.list_rules(&RuleFilter::active())
    }
}
