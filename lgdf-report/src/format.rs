//! Input parsing and display formatting for the report front end.

use lgdf_core::calculations::common::{round_cents, round_whole_units};
use num_format::{Locale, ToFormattedString};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Trims whitespace, a trailing percent sign and comma thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    s.trim().trim_end_matches('%').trim_end().replace(',', "")
}

/// Parses user input such as `"1,234.56"` or `"6.47%"` into a [`Decimal`].
///
/// Empty or whitespace-only input is treated as 0.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::warn!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Formats an amount rounded to whole units with thousands separators,
/// e.g. `1739130.43` becomes `"1,739,130"`.
pub fn format_amount(amount: Decimal) -> String {
    let whole = round_whole_units(amount);
    match whole.to_i128() {
        Some(n) => n.to_formatted_string(&Locale::en),
        None => whole.to_string(),
    }
}

/// Formats a rate in percent with two decimals, e.g. `"6.47%"`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", round_cents(rate))
}

/// Formats a signed rate difference, e.g. `"+3.53"` or `"-0.75"`.
pub fn format_rate_difference(difference: Decimal) -> String {
    let rounded = round_cents(difference);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("{rounded:.2}")
    } else {
        format!("+{:.2}", rounded.abs())
    }
}

/// Formats a count with thousands separators.
pub fn format_count(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}
