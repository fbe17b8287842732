//! Locale-aware number parsing for statement amounts
//!
//! Statements print amounts in European notation (`1.234,56`, `1 234,56`) as well
//! as plain `1234.56`. Everything funnels through [`normalize_number`].

use regex::Regex;
use std::sync::OnceLock;

/// Amount with exactly two decimals, optionally thousands-grouped
pub const NUM_WITH_DECIMALS_PATTERN: &str = r"[-+]?\d{1,3}(?:[.,\s\u{00A0}]\d{3})*[.,]\d{2}";

/// Any amount, decimals optional
pub const NUM_PATTERN: &str = r"[-+]?\d{1,3}(?:[.,\s\u{00A0}]\d{3})*(?:[.,]\d{2})?";

pub fn num_with_decimals_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUM_WITH_DECIMALS_PATTERN).expect("decimal amount regex"))
}

pub fn num_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUM_PATTERN).expect("amount regex"))
}

/// Convert a locale-formatted number to `f64`
///
/// Spaces (including NBSP) are dropped. When both `.` and `,` appear, whichever
/// comes last is the decimal separator; a lone `,` is a decimal comma.
pub fn normalize_number(value: &str) -> Option<f64> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }

    let text: String = text.chars().filter(|c| *c != '\u{00A0}' && *c != ' ').collect();

    let cleaned = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => text.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => text.replace(',', ""),
        (Some(_), None) => text.replace(',', "."),
        _ => text,
    };

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Pull the first amount out of free text
///
/// Prefers a two-decimal amount; falls back to any number.
pub fn parse_amount(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let m = num_with_decimals_re()
        .find(text)
        .or_else(|| num_re().find(text))?;
    normalize_number(m.as_str())
}
