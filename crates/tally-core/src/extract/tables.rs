//! Table-based extraction and column role detection

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::document::{Document, Table};
use crate::models::TransactionRecord;
use crate::numbers::{normalize_number, num_with_decimals_re, parse_amount};

/// Column indices assigned to each role of a statement table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub processed: Option<usize>,
    pub description: Option<usize>,
    pub amount: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Date,
    Processed,
    Description,
    Amount,
}

/// Header keywords per role, checked in this order for every column
fn role_patterns() -> &'static [(Role, Regex)] {
    static PATTERNS: OnceLock<Vec<(Role, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (Role::Date, r"data|tranzac"),
            (Role::Processed, r"proces|post|valut|settle"),
            (Role::Description, r"descr|detali|merchant|descriere"),
            (Role::Amount, r"lei|sum|amount|valoare|debit|plati"),
        ]
        .into_iter()
        .map(|(role, pattern)| (role, Regex::new(pattern).expect("column role regex")))
        .collect()
    })
}

impl ColumnMap {
    fn slot(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Date => &mut self.date,
            Role::Processed => &mut self.processed,
            Role::Description => &mut self.description,
            Role::Amount => &mut self.amount,
        }
    }
}

/// Assign column roles from a header row
///
/// Each role takes the first column whose lowercased label matches its
/// keywords. Returns None when no amount column is recognisable and the page
/// has no card anchor. Otherwise the amount defaults to the last column and
/// the description to the longest header label.
pub fn detect_columns(header: &[Option<String>], has_anchor: bool) -> Option<ColumnMap> {
    let mut map = ColumnMap::default();

    for (idx, cell) in header.iter().enumerate() {
        let label = cell.as_deref().unwrap_or("").trim().to_lowercase();
        if label.is_empty() {
            continue;
        }
        for (role, re) in role_patterns() {
            let slot = map.slot(*role);
            if slot.is_none() && re.is_match(&label) {
                *slot = Some(idx);
            }
        }
    }

    if map.amount.is_none() && !has_anchor {
        return None;
    }

    let amount = *map.amount.get_or_insert(header.len().saturating_sub(1));

    if map.description.is_none() && header.len() >= 2 {
        let mut wordiest = 0;
        let mut longest = 0;
        for (idx, cell) in header.iter().enumerate() {
            let len = cell.as_deref().map(|c| c.chars().count()).unwrap_or(0);
            if len > longest {
                longest = len;
                wordiest = idx;
            }
        }
        if wordiest != amount {
            map.description = Some(wordiest);
        }
    }

    Some(map)
}

fn cell_at(row: &[Option<String>], idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i)).and_then(|c| c.as_deref())
}

fn normalize_cell(cell: Option<&str>) -> Option<String> {
    let cleaned = cell?.replace('\n', " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Convert the data rows of one table into records
pub fn records_from_table(table: &Table, has_anchor: bool) -> Vec<TransactionRecord> {
    if table.len() < 2 {
        return Vec::new();
    }
    let Some(header) = table.header() else {
        return Vec::new();
    };
    let Some(columns) = detect_columns(header, has_anchor) else {
        debug!("Skipping table without an amount column");
        return Vec::new();
    };

    let mut records = Vec::new();
    for row in &table.rows[1..] {
        let blank = row
            .iter()
            .all(|c| c.as_deref().map(str::is_empty).unwrap_or(true));
        if blank {
            continue;
        }

        let description = normalize_cell(cell_at(row, columns.description));
        let amount = cell_at(row, columns.amount).and_then(parse_amount);
        let transaction_date = normalize_cell(cell_at(row, columns.date));
        let processed_date = normalize_cell(cell_at(row, columns.processed));

        if let Some(record) =
            TransactionRecord::new(transaction_date, processed_date, description, amount)
        {
            records.push(record);
        }
    }
    debug!("Accepted {} of {} rows", records.len(), table.len() - 1);
    records
}

const DEBIT_KEYS: &[&str] = &[
    "ies", "debit", "plati", "ieș", "iesiri", "ieșiri", "plăti", "retragere",
];

/// Sum the debit-like column of every table in the document
///
/// Only two-decimal amounts count, so dates and reference numbers in the
/// column are ignored. Returns None when nothing was counted.
pub fn sum_debit_columns(document: &Document) -> Option<f64> {
    let mut total = 0.0;
    let mut found_any = false;

    for table in document.pages.iter().flat_map(|p| p.tables.iter()) {
        let header = table.rows.iter().find(|row| {
            row.iter()
                .any(|c| c.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false))
        });
        let Some(header) = header else {
            continue;
        };

        let debit_idx = header
            .iter()
            .position(|cell| {
                let label = cell.as_deref().unwrap_or("").trim().to_lowercase();
                DEBIT_KEYS.iter().any(|key| label.contains(key))
            })
            .unwrap_or(header.len().saturating_sub(1));

        for row in table.rows.iter().skip(1) {
            let Some(cell) = row.get(debit_idx).and_then(|c| c.as_deref()) else {
                continue;
            };
            let cell = cell.replace('\n', " ");
            if let Some(value) = num_with_decimals_re()
                .find(cell.trim())
                .and_then(|m| normalize_number(m.as_str()))
            {
                found_any = true;
                total += value;
            }
        }
    }

    found_any.then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Page;

    fn header(labels: &[&str]) -> Vec<Option<String>> {
        labels.iter().map(|l| Some(l.to_string())).collect()
    }

    #[test]
    fn test_detect_romanian_header() {
        let map = detect_columns(&header(&["Data", "Procesare", "Descriere", "Suma (LEI)"]), false)
            .unwrap();
        assert_eq!(
            map,
            ColumnMap {
                date: Some(0),
                processed: Some(1),
                description: Some(2),
                amount: Some(3),
            }
        );
    }

    #[test]
    fn test_detect_english_header() {
        let map = detect_columns(
            &header(&["Transaction date", "Posting date", "Merchant", "Amount"]),
            false,
        )
        .unwrap();
        assert_eq!(map.processed, Some(1));
        assert_eq!(map.description, Some(2));
        assert_eq!(map.amount, Some(3));
    }

    #[test]
    fn test_wordiest_column_becomes_description() {
        let map = detect_columns(&header(&["Nr", "Informatii operatiune", "Valoare"]), false)
            .unwrap();
        assert_eq!(map.amount, Some(2));
        assert_eq!(map.description, Some(1));
    }

    #[test]
    fn test_wordiest_column_skipped_when_it_is_the_amount() {
        let map = detect_columns(&header(&["X", "Long amount header"]), true).unwrap();
        assert_eq!(map.amount, Some(1));
        assert_eq!(map.description, None);
    }

    #[test]
    fn test_no_amount_without_anchor_is_skipped() {
        assert!(detect_columns(&header(&["A", "B", "C"]), false).is_none());
        let map = detect_columns(&header(&["A", "B", "C"]), true).unwrap();
        assert_eq!(map.amount, Some(2));
        assert_eq!(map.description, Some(0));
    }

    #[test]
    fn test_rows_without_description_or_amount_are_dropped() {
        let table = Table {
            rows: vec![
                header(&["Data", "Descriere", "Suma"]),
                vec![Some("01.08.2025".into()), None, Some("5,00".into())],
                vec![Some("01.08.2025".into()), Some("SHOP".into()), Some("n/a".into())],
                vec![None, Some(String::new()), None],
                vec![Some("02.08.2025".into()), Some("CAFE\nCENTRAL".into())],
                vec![Some("03.08.2025".into()), Some("  BAKERY ".into()), Some("7,20".into())],
            ],
        };
        let records = records_from_table(&table, false);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("BAKERY"));
        assert_eq!(records[0].amount_lei, Some(7.2));
    }

    #[test]
    fn test_multiline_cells_are_joined() {
        let table = Table::from_rows(vec![
            vec!["Data", "Descriere", "Suma"],
            vec!["01.08.2025", "CAFE\nCENTRAL", "3,00"],
        ]);
        let records = records_from_table(&table, false);
        assert_eq!(records[0].description.as_deref(), Some("CAFE CENTRAL"));
    }

    #[test]
    fn test_single_row_table_is_skipped() {
        let table = Table::from_rows(vec![vec!["Data", "Descriere", "Suma"]]);
        assert!(records_from_table(&table, true).is_empty());
    }

    #[test]
    fn test_sum_debit_column() {
        let table = Table::from_rows(vec![
            vec!["Descriere", "Debit"],
            vec!["A", "10,00"],
            vec!["B", "5,50"],
            vec!["C", "not a number"],
        ]);
        let doc = Document::from_pages(vec![Page::new("").with_tables(vec![table])]);
        assert_eq!(sum_debit_columns(&doc), Some(15.5));
    }

    #[test]
    fn test_sum_debit_ignores_integers() {
        let table = Table::from_rows(vec![vec!["Cod", "Nr"], vec!["X", "2025"]]);
        let doc = Document::from_pages(vec![Page::new("").with_tables(vec![table])]);
        assert_eq!(sum_debit_columns(&doc), None);
    }
}
