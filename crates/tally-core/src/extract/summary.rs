//! Statement header fields found by label search

use regex::Regex;
use std::sync::OnceLock;

use crate::models::StatementSummary;
use crate::numbers::{normalize_number, num_re, NUM_PATTERN};

/// Label alternatives for one summary field, tried in order
struct FieldLabels {
    /// Full patterns with a `val` capture
    patterns: Vec<Regex>,
    /// Bare label used for the look-ahead fallback
    label: Option<Regex>,
}

impl FieldLabels {
    fn new(patterns: &[&str], label: Option<&str>) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| {
                    let p = p.replace("{NUM}", NUM_PATTERN);
                    Regex::new(&format!("(?i){}", p)).expect("summary label regex")
                })
                .collect(),
            label: label.map(|l| Regex::new(&format!("(?i){}", l)).expect("summary label regex")),
        }
    }

    /// Value captured by the first pattern that matches anywhere in the text
    fn first_match(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|caps| caps.name("val"))
                .map(|m| m.as_str().trim().to_string())
        })
    }

    /// First number within `window` characters after the bare label
    fn find_after(&self, text: &str, window: usize) -> Option<String> {
        let m = self.label.as_ref()?.find(text)?;
        let rest = &text[m.end()..];
        let end = rest
            .char_indices()
            .nth(window)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        num_re().find(&rest[..end]).map(|n| n.as_str().to_string())
    }

    fn number(&self, text: &str, window: usize) -> Option<f64> {
        self.first_match(text)
            .filter(|v| !v.is_empty())
            .or_else(|| self.find_after(text, window))
            .and_then(|v| normalize_number(&v))
    }
}

struct SummaryLabels {
    client: FieldLabels,
    account: FieldLabels,
    opening: FieldLabels,
    closing: FieldLabels,
    outflow: FieldLabels,
}

fn labels() -> &'static SummaryLabels {
    static LABELS: OnceLock<SummaryLabels> = OnceLock::new();
    LABELS.get_or_init(|| SummaryLabels {
        client: FieldLabels::new(
            &[
                r"Clientul\s*[:\-]?\s*(?P<val>.+)",
                r"Nume\s+client\s*[:\-]?\s*(?P<val>.+)",
                r"Titular\s*[:\-]?\s*(?P<val>.+)",
            ],
            None,
        ),
        account: FieldLabels::new(
            &[
                r"Num[aă]r(?:ul)?\s+contului\s*[:\-]?\s*(?P<val>[^\r\n]+)",
                r"IBAN\s*[:\-]?\s*(?P<val>[^\r\n]+)",
            ],
            None,
        ),
        opening: FieldLabels::new(
            &[
                r"Sold(?:ul)?\s+ini(?:ț|ţ|t)i?al\s*[:\-]?\s*(?P<val>{NUM})",
                r"Sold\s+de\s+deschidere\s*[:\-]?\s*(?P<val>{NUM})",
            ],
            Some(r"Sold(?:ul)?\s+ini(?:ț|ţ|t)i?al"),
        ),
        closing: FieldLabels::new(
            &[
                r"Sold(?:ul)?\s+fin(?:a|ă)l\s*[:\-]?\s*(?P<val>{NUM})",
                r"Sold\s+de\s+închidere\s*[:\-]?\s*(?P<val>{NUM})",
                r"Sold\s+de\s+inchidere\s*[:\-]?\s*(?P<val>{NUM})",
            ],
            Some(r"Sold(?:ul)?\s+fin(?:a|ă)l|Sold\s+de\s+închidere|Sold\s+de\s+inchidere"),
        ),
        outflow: FieldLabels::new(
            &[
                r"Total\s+ie[sșş]ir[iîí]\s*[:\-]?\s*(?P<val>{NUM})",
                r"Total\s+pl[aă][tțţ][iîí]\s*[:\-]?\s*(?P<val>{NUM})",
                r"Total\s+debit\s*[:\-]?\s*(?P<val>{NUM})",
            ],
            Some(r"Total\s+ie[sșş]ir[iîí]|Total\s+pl[aă][tțţ][iîí]|Total\s+debit"),
        ),
    })
}

fn iban_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{2}\d{2}[A-Z0-9]{10,30}\b").expect("IBAN regex"))
}

fn find_iban(text: &str) -> Option<String> {
    iban_re()
        .find(&text.replace(' ', ""))
        .or_else(|| iban_re().find(text))
        .map(|m| m.as_str().to_uppercase())
}

/// Account number from the labelled line, else any IBAN-shaped token in the text
fn resolve_account(account_line: Option<&str>, text: &str) -> Option<String> {
    let from_line = account_line.and_then(|line| {
        find_iban(line).or_else(|| {
            line.split_whitespace().find_map(|token| {
                let cleaned: String = token.chars().filter(char::is_ascii_alphanumeric).collect();
                let starts_alpha = cleaned
                    .chars()
                    .take(2)
                    .filter(char::is_ascii_alphabetic)
                    .count()
                    == 2;
                (cleaned.len() >= 16 && starts_alpha).then(|| cleaned.to_uppercase())
            })
        })
    });

    from_line
        .or_else(|| find_iban(text))
        .map(|account| account.split_whitespace().collect::<String>().to_uppercase())
}

/// Search the statement text for every labelled summary field
pub fn search_labels(text: &str, window: usize) -> StatementSummary {
    let labels = labels();

    let client_name = labels.client.first_match(text).filter(|c| !c.is_empty());
    let account_line = labels.account.first_match(text);

    StatementSummary {
        client_name,
        account_number: resolve_account(account_line.as_deref(), text),
        total_outflow: labels.outflow.number(text, window),
        opening_balance: labels.opening.number(text, window),
        closing_balance: labels.closing.number(text, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Clientul: Ion Popescu\n\
                          Numarul contului: MD12AGRN0000000000000000\n\
                          Sold initial: 1.234,00\n\
                          Total iesiri: 123,45\n\
                          Sold final: 1.110,55\n";

    #[test]
    fn test_search_all_labels() {
        let summary = search_labels(SAMPLE, 120);
        assert_eq!(summary.client_name.as_deref(), Some("Ion Popescu"));
        assert_eq!(
            summary.account_number.as_deref(),
            Some("MD12AGRN0000000000000000")
        );
        assert_eq!(summary.opening_balance, Some(1234.0));
        assert_eq!(summary.total_outflow, Some(123.45));
        assert_eq!(summary.closing_balance, Some(1110.55));
    }

    #[test]
    fn test_diacritic_labels() {
        let text = "Titular - Maria Ionescu\n\
                    Număr contului: md12 agrn 0000 0000 0000 0000\n\
                    Soldul inițial: 10,00\n\
                    Total plăți: 5,00\n\
                    Sold de închidere: 5,00";
        let summary = search_labels(text, 120);
        assert_eq!(summary.client_name.as_deref(), Some("Maria Ionescu"));
        assert_eq!(summary.opening_balance, Some(10.0));
        assert_eq!(summary.total_outflow, Some(5.0));
        assert_eq!(summary.closing_balance, Some(5.0));
    }

    #[test]
    fn test_lowercase_account_uses_long_token() {
        let summary = search_labels("IBAN: md12agrn0000000000000000", 120);
        assert_eq!(
            summary.account_number.as_deref(),
            Some("MD12AGRN0000000000000000")
        );
    }

    #[test]
    fn test_account_found_anywhere_in_text() {
        let summary = search_labels("Extras pentru MD12AGRN0000000000000000 luna august", 120);
        assert_eq!(
            summary.account_number.as_deref(),
            Some("MD12AGRN0000000000000000")
        );
    }

    #[test]
    fn test_value_on_following_line() {
        let text = "Sold final\n(MDL)\n2.500,00";
        let summary = search_labels(text, 120);
        assert_eq!(summary.closing_balance, Some(2500.0));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let summary = search_labels("nothing useful here", 120);
        assert_eq!(summary, StatementSummary::default());
    }
}
