//! Display formatting for ratios and volumes.
//!
//! Both formatters are total: NaN and the infinities format exactly like `0`.

const GROUP_SEPARATOR: char = ',';

fn finite_or_zero(value: f64) -> f64 {
    // `+ 0.0` folds negative zero into positive zero.
    if value.is_finite() { value + 0.0 } else { 0.0 }
}

/// Ratio with exactly two fractional digits, no grouping, no forced sign.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}", finite_or_zero(value))
}

/// Integer part grouped by thousands; whatever fractional part the value
/// carries is kept as is.
pub fn format_count(value: f64) -> String {
    let value = finite_or_zero(value);
    let raw = value.to_string();
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };
    let mut grouped = String::with_capacity(raw.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
