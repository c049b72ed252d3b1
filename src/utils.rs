// Formatting helpers for report values
use crate::model::Reading;

pub const INSUFFICIENT_PLACEHOLDER: &str = "n/a (insufficient data)";
pub const INDETERMINATE_PLACEHOLDER: &str = "n/a (indeterminate)";

/// Formats a value or the matching placeholder; a missing value never renders as zero.
pub fn format_reading<T>(reading: &Reading<T>, f: impl FnOnce(&T) -> String) -> String {
    match reading {
        Reading::Value(v) => f(v),
        Reading::InsufficientData => INSUFFICIENT_PLACEHOLDER.to_string(),
        Reading::Indeterminate => INDETERMINATE_PLACEHOLDER.to_string(),
    }
}

/// Two decimals, e.g. `4.52`.
pub fn format_price(reading: &Reading<f64>) -> String {
    format_reading(reading, |v| format!("{:.2}", v))
}

/// Explicit sign, two decimals, e.g. `+1.23%`.
pub fn format_signed_pct(reading: &Reading<f64>) -> String {
    format_reading(reading, |v| format!("{:+.2}%", v))
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Length in UTF-16 code units, the unit Telegram applies its limits in.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Like [`truncate_chars`], but the budget is counted in UTF-16 code units.
pub fn truncate_utf16(text: &str, max: usize) -> String {
    if utf16_len(text) <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}
