//! Number formatting for attribute values.

/// Formats `value` with at most four decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    let mut text = format!("{value:.4}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// A length with a unit suffix, such as `297mm`.
pub fn format_length(value: f64, unit: &str) -> String {
    format!("{}{unit}", format_number(value))
}
