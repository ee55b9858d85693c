//! Interpretation of the free-text numeric and boolean cells of an import row.
//!
//! Shared by the validator and the writer so both agree on what a cell means.
//! The bounds follow the catalog columns: prices are `NUMERIC(14,2)`,
//! weights `NUMERIC(10,2)` and stock `INTEGER`.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places stored for prices and weights.
const STORED_SCALE: u32 = 2;

/// Returns the trimmed cell text, or `None` for an absent or blank cell.
#[must_use]
pub fn present(raw: Option<&String>) -> Option<&str> {
    raw.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Parses a decimal after removing whitespace and `,` thousands separators,
/// so `"150,000"` reads as `150000`.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

fn max_price() -> Decimal {
    Decimal::new(99_999_999_999_999, STORED_SCALE)
}

fn max_weight() -> Decimal {
    Decimal::new(9_999_999_999, STORED_SCALE)
}

/// Rounds half away from zero to the stored scale, as Postgres does on insert.
fn stored(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(STORED_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn number(text: &str) -> Result<Decimal, String> {
    parse_decimal(text).ok_or_else(|| format!("'{text}' is not a number"))
}

/// Parses a price, rounded to cents. It must stay above zero after rounding.
///
/// # Errors
///
/// Returns a message naming the offending text when it is not a number,
/// rounds to zero or below, or exceeds the stored precision.
pub fn parse_price(text: &str) -> Result<Decimal, String> {
    let value = stored(number(text)?);
    if value <= Decimal::ZERO {
        return Err(format!("must be at least 0.01, got '{text}'"));
    }
    if value > max_price() {
        return Err(format!("must be at most {}, got '{text}'", max_price()));
    }
    Ok(value)
}

/// Parses a non-negative weight, rounded to two decimal places.
///
/// # Errors
///
/// Returns a message when the text is not a number, is negative, or exceeds
/// the stored precision.
pub fn parse_weight(text: &str) -> Result<Decimal, String> {
    let value = stored(number(text)?);
    if value.is_sign_negative() && !value.is_zero() {
        return Err(format!("must not be negative, got '{text}'"));
    }
    if value > max_weight() {
        return Err(format!("must be at most {}, got '{text}'", max_weight()));
    }
    Ok(value)
}

/// Parses a stock quantity. Fractional values are truncated.
///
/// # Errors
///
/// Returns a message when the text is not a number or falls outside
/// `0..=i32::MAX` after truncation.
pub fn parse_count(text: &str) -> Result<i32, String> {
    let value = number(text)?.trunc();
    value
        .to_i32()
        .filter(|n| *n >= 0)
        .ok_or_else(|| format!("must be between 0 and {}, got '{text}'", i32::MAX))
}

/// Case-insensitive `true` / `false`.
#[must_use]
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
