//! Amount normalization for Vietnamese numeric shorthand.
//!
//! Users (and the upstream model echoing them) write amounts like `40k`,
//! `2tr`, `25 nghìn` or plain digits. Everything is normalized to integer
//! VND; fractional results are rejected.

use serde_json::Value;

/// Multiplier for a shorthand unit suffix. Unknown suffixes reject the
/// amount rather than silently taking the bare number.
fn unit_multiplier(unit: &str) -> Option<i64> {
    match unit.trim().to_lowercase().as_str() {
        "" => Some(1),
        "k" | "nghìn" | "nghin" | "ngàn" | "ngan" => Some(1_000),
        "tr" | "triệu" | "trieu" => Some(1_000_000),
        _ => None,
    }
}

/// Parses `"40k"`, `"2tr"`, `"2 triệu"`, `"1.5tr"`, `"50000"` into VND.
///
/// Accepts `.` or `,` as the decimal separator and an optional space before
/// the unit. Returns `None` for anything non-positive, non-integral after
/// scaling, or not shaped like `<number><unit>`.
pub(crate) fn parse_shorthand(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let digits_end = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.' && *c != ',')
        .map_or(trimmed.len(), |(i, _)| i);
    let (number_str, unit_str) = trimmed.split_at(digits_end);
    let multiplier = unit_multiplier(unit_str)?;

    let number_str = number_str.replace(',', ".");
    let mut parts = number_str.split('.');
    let whole_str = parts.next()?;
    let frac_str = parts.next().unwrap_or("");
    if parts.next().is_some() || whole_str.is_empty() {
        return None;
    }

    let whole: i64 = whole_str.parse().ok()?;
    let mut amount = whole.checked_mul(multiplier)?;

    if !frac_str.is_empty() {
        let frac: i64 = frac_str.parse().ok()?;
        let scale = 10_i64.checked_pow(frac_str.len() as u32)?;
        // The fraction must scale to whole VND (1.5tr ok, 1.5 alone is not).
        let scaled = frac.checked_mul(multiplier)?;
        if scaled % scale != 0 {
            return None;
        }
        amount = amount.checked_add(scaled / scale)?;
    }

    (amount > 0).then_some(amount)
}

/// Extracts a positive integral VND amount from a JSON value: integral
/// numbers taken literally, strings run through shorthand parsing.
pub(crate) fn from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                (int > 0).then_some(int)
            } else {
                let float = number.as_f64()?;
                (float > 0.0 && float.fract() == 0.0 && float <= i64::MAX as f64)
                    .then_some(float as i64)
            }
        }
        Value::String(text) => parse_shorthand(text),
        _ => None,
    }
}

/// Combines a matched number and optional unit capture from the rule table.
pub(crate) fn from_captures(number: &str, unit: Option<&str>) -> Option<i64> {
    let mut combined = number.to_string();
    combined.push_str(unit.unwrap_or(""));
    parse_shorthand(&combined)
}
