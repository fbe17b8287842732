//! Text-line fallback for statements whose tables could not be recovered

use regex::Regex;
use std::sync::OnceLock;

use super::ExtractorOptions;
use crate::models::TransactionRecord;
use crate::numbers::{normalize_number, NUM_WITH_DECIMALS_PATTERN};

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:\d{2}[./-]\d{2}[./-]\d{2,4}|\d{4}[./-]\d{2}[./-]\d{2})\b")
            .expect("date regex")
    })
}

/// A three-letter code followed by a two-decimal amount
fn currency_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"\b(?P<ccy>[A-Za-z]{{3}})\b\s*(?P<amt>{})",
            NUM_WITH_DECIMALS_PATTERN
        ))
        .expect("currency amount regex")
    })
}

/// Trailing noise left in a merchant segment: separators, signed numbers, "- 412" codes
fn trailing_noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:[-–—]\s*\d{1,6}|[-+]?\d{1,3}(?:[.,\s\u{00A0}]\d{3})*(?:[.,]\d{2})?|[-–—:\s]+)$",
        )
        .expect("trailing noise regex")
    })
}

fn leading_separators_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-–—:\s]+").expect("leading separator regex"))
}

/// Parse every line carrying a `<CCY> <amount>` token into a record
pub fn extract_records(text: &str, options: &ExtractorOptions) -> Vec<TransactionRecord> {
    text.lines()
        .filter_map(|raw| parse_line(raw, options))
        .collect()
}

/// Parse one statement line
///
/// The merchant is whatever sits between the last date token and the currency
/// token. Amounts in the local currency are made absolute.
pub fn parse_line(raw: &str, options: &ExtractorOptions) -> Option<TransactionRecord> {
    let line = raw.replace('\u{00A0}', " ");
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let caps = currency_amount_re().captures_iter(line).find(|caps| {
        options
            .currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&caps["ccy"]))
    })?;
    let ccy_match = caps.name("ccy")?;
    let currency = ccy_match.as_str().to_uppercase();
    let mut amount = normalize_number(&caps["amt"])?;
    if currency.eq_ignore_ascii_case(&options.local_currency) {
        amount = amount.abs();
    }

    let dates: Vec<_> = date_re().find_iter(line).take(2).collect();
    let transaction_date = dates.first().map(|m| m.as_str().to_string());
    let processed_date = dates.get(1).map(|m| m.as_str().to_string());

    let segment_start = dates.last().map(|m| m.end()).unwrap_or(0);
    let segment_end = ccy_match.start();
    let segment = if segment_start < segment_end {
        &line[segment_start..segment_end]
    } else {
        ""
    };

    let merchant = clean_merchant(segment, &options.currencies);
    if !merchant.chars().any(char::is_alphabetic) {
        return None;
    }

    TransactionRecord::new(transaction_date, processed_date, Some(merchant), Some(amount))
}

/// Reduce a raw merchant segment to the merchant name
pub fn clean_merchant(segment: &str, currencies: &[String]) -> String {
    let mut merchant = segment
        .split_whitespace()
        .filter(|token| !currencies.iter().any(|c| c == token))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['"', '\''], "");

    while let Some(m) = trailing_noise_re().find(&merchant) {
        if m.start() == merchant.len() {
            break;
        }
        merchant.truncate(m.start());
    }

    let merchant = leading_separators_re().replace(&merchant, "");
    merchant.split_whitespace().collect::<Vec<_>>().join(" ")
}
