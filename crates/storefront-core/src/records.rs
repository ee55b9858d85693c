//! Write-side records handed from the importer to the catalog store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{ProductStatus, VariantKey};

/// A product about to be inserted.
///
/// When `has_variants` is `true`, `stock` is expected to be `0`; per-variant
/// stock lives on the variant rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_digital: bool,
    pub weight: Option<Decimal>,
    pub status: ProductStatus,
    pub has_notes: bool,
    pub has_variants: bool,
}

/// One selectable option of one tier, e.g. tier 1 "Color" = "Red".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVariantOption {
    pub product_id: i64,
    /// 1, 2 or 3.
    pub tier_level: i16,
    pub tier_name: String,
    pub option_value: String,
    pub sort_order: i32,
}

/// One generated combination, defaulted from the product's price and stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVariant {
    pub product_id: i64,
    pub key: VariantKey,
    /// Product name followed by each tier value, e.g. `"Shirt Red L"`.
    pub full_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub weight: Option<Decimal>,
    pub sku: Option<String>,
    pub is_active: bool,
}

/// A variant as persisted, returned from a bulk insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVariant {
    pub id: i64,
    pub key: VariantKey,
    pub full_name: String,
}

/// Per-variant overrides taken from an import row. `None` leaves the
/// persisted value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPatch {
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub weight: Option<Decimal>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl VariantPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.stock.is_none()
            && self.weight.is_none()
            && self.sku.is_none()
            && self.is_active.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
    }
}
