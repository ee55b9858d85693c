//! Row Validator: field-level checks on a single [`InputRow`].

use std::fmt;

use serde::Serialize;
use storefront_core::ProductStatus;

use crate::input::InputRow;
use crate::numeric::{parse_count, parse_flag, parse_price, parse_weight, present};

/// One problem with one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub row_index: usize,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(row_index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row_index, self.field, self.message)
    }
}

/// Checks every rule against `row` and returns all violations found.
///
/// Never short-circuits: a row with a bad price and a bad stock reports
/// both. An empty result means the row can be imported.
#[must_use]
pub fn validate(row: &InputRow, row_index: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |field: &str, message: String| {
        errors.push(ValidationError::new(row_index, field, message));
    };

    if row.name().is_empty() {
        push("product_name", "product name is required".to_string());
    }

    match present(row.price.as_ref()) {
        None => push("price", "price is required".to_string()),
        Some(raw) => {
            if let Err(message) = parse_price(raw) {
                push("price", message);
            }
        }
    }

    let checks: [(&str, &Option<String>, fn(&str) -> Result<(), String>); 5] = [
        ("stock", &row.stock, |raw| parse_count(raw).map(drop)),
        ("weight", &row.weight, |raw| parse_weight(raw).map(drop)),
        ("variant_price", &row.variant_price, |raw| parse_price(raw).map(drop)),
        ("variant_stock", &row.variant_stock, |raw| parse_count(raw).map(drop)),
        ("variant_weight", &row.variant_weight, |raw| parse_weight(raw).map(drop)),
    ];
    for (field, value, check) in checks {
        if let Some(raw) = present(value.as_ref()) {
            if let Err(message) = check(raw) {
                push(field, message);
            }
        }
    }

    for (field, value) in [
        ("is_digital", &row.is_digital),
        ("has_notes", &row.has_notes),
        ("variant_is_active", &row.variant_is_active),
    ] {
        if let Some(raw) = present(value.as_ref()) {
            if parse_flag(raw).is_none() {
                push(field, format!("must be true or false, got '{raw}'"));
            }
        }
    }

    if let Some(raw) = present(row.status.as_ref()) {
        if raw.parse::<ProductStatus>().is_err() {
            push(
                "status",
                format!("must be one of active, inactive, draft; got '{raw}'"),
            );
        }
    }

    for (level, (name, value)) in row.tier_slots().into_iter().enumerate() {
        if value.is_some() && name.is_none() {
            let level = level + 1;
            push(
                &format!("tier{level}_name"),
                format!("tier {level} has a value but no name"),
            );
        }
    }

    if let Some(sku) = &row.variant_sku {
        if sku.trim().is_empty() {
            push("variant_sku", "sku must not be blank".to_string());
        }
    }

    errors
}
