//! Product/Variant Writer: persists one [`ProductGroup`].

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use storefront_core::{
    CoreError, NewProduct, NewVariant, NewVariantOption, ProductStatus, VariantKey, VariantPatch,
};
use storefront_storage::{extension_for, object_name};
use thiserror::Error;
use uuid::Uuid;

use crate::error::StoreError;
use crate::group::ProductGroup;
use crate::input::InputRow;
use crate::numeric::{parse_count, parse_flag, parse_price, parse_weight, present};
use crate::store::{CatalogStore, ImageStore};

/// Sub-step of a write that failed without sinking the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStep {
    ProductImage,
    VariantOptions,
    Variants,
    VariantImage,
    VariantUpdate,
    VariantMatch,
}

impl WarningStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WarningStep::ProductImage => "product_image",
            WarningStep::VariantOptions => "variant_options",
            WarningStep::Variants => "variants",
            WarningStep::VariantImage => "variant_image",
            WarningStep::VariantUpdate => "variant_update",
            WarningStep::VariantMatch => "variant_match",
        }
    }
}

impl fmt::Display for WarningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportWarning {
    pub step: WarningStep,
    pub message: String,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Result of a product write that got past the product insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub product_id: i64,
    pub product_name: String,
    /// Number of variants persisted.
    pub variant_count: usize,
    pub warnings: Vec<ImportWarning>,
}

/// Failure that leaves no product behind.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("product '{product}' has an invalid base row: {reason}")]
    InvalidBaseRow { product: String, reason: String },

    #[error("failed to insert product '{product}': {source}")]
    ProductInsert {
        product: String,
        #[source]
        source: StoreError,
    },
}

/// Writes product groups for one owner through the given stores.
pub struct ProductWriter<'a, C, I> {
    catalog: &'a C,
    images: &'a I,
}

impl<'a, C: CatalogStore, I: ImageStore> ProductWriter<'a, C, I> {
    #[must_use]
    pub fn new(catalog: &'a C, images: &'a I) -> Self {
        Self { catalog, images }
    }

    /// Persists `group`: the product, its image, its option catalog and one
    /// variant per combination, then per-row variant overrides.
    ///
    /// Only the product insert is fatal. Everything after it is best-effort
    /// and reported through [`WriteOutcome::warnings`].
    ///
    /// # Errors
    ///
    /// - [`WriteError::InvalidBaseRow`] — the base row's price, stock, weight
    ///   or status cannot be interpreted.
    /// - [`WriteError::ProductInsert`] — the catalog rejected the product.
    pub async fn write(
        &self,
        group: &ProductGroup,
        owner_id: Uuid,
    ) -> Result<WriteOutcome, WriteError> {
        let name = group.product_name.as_str();
        let base = BaseValues::from_row(name, &group.base_row)?;
        let product = base.new_product(owner_id, name, group);

        let product_id = self
            .catalog
            .insert_product(&product)
            .await
            .map_err(|source| WriteError::ProductInsert {
                product: name.to_string(),
                source,
            })?;

        let mut outcome = WriteOutcome {
            product_id,
            product_name: name.to_string(),
            variant_count: 0,
            warnings: Vec::new(),
        };

        if let Some(url) = present(group.base_row.image_url.as_ref()) {
            let dir = format!("{owner_id}/products/{product_id}");
            let attached = match self.store_image(url, &dir).await {
                Ok(public_url) => self.catalog.set_product_image(product_id, &public_url).await,
                Err(e) => Err(e),
            };
            if let Err(e) = attached {
                record_warning(&mut outcome, WarningStep::ProductImage, format!("{url}: {e}"));
            }
        }

        if group.has_variants {
            self.write_variants(group, owner_id, &base, &mut outcome).await;
        }

        tracing::info!(
            product = %name,
            product_id,
            variants = outcome.variant_count,
            warnings = outcome.warnings.len(),
            "product written"
        );
        Ok(outcome)
    }

    async fn write_variants(
        &self,
        group: &ProductGroup,
        owner_id: Uuid,
        base: &BaseValues,
        outcome: &mut WriteOutcome,
    ) {
        let product_id = outcome.product_id;
        let tiers = group.tiers();

        let options: Vec<NewVariantOption> = tiers
            .iter()
            .flat_map(|tier| {
                tier.options.iter().enumerate().map(|(idx, value)| NewVariantOption {
                    product_id,
                    tier_level: i16::from(tier.level),
                    tier_name: tier.name.clone(),
                    option_value: value.clone(),
                    sort_order: i32::try_from(idx).unwrap_or(i32::MAX),
                })
            })
            .collect();
        if let Err(e) = self.catalog.insert_variant_options(&options).await {
            record_warning(outcome, WarningStep::VariantOptions, e.to_string());
        }

        let variants: Vec<NewVariant> = group
            .combinations()
            .into_iter()
            .map(|combo| NewVariant {
                product_id,
                key: combo.key,
                full_name: combo.full_name,
                price: base.price,
                stock: base.stock,
                weight: None,
                sku: None,
                is_active: true,
            })
            .collect();
        let stored = match self.catalog.insert_variants(&variants).await {
            Ok(stored) => stored,
            Err(e) => {
                record_warning(outcome, WarningStep::Variants, e.to_string());
                return;
            }
        };
        outcome.variant_count = stored.len();

        let ids: HashMap<&VariantKey, i64> = stored.iter().map(|v| (&v.key, v.id)).collect();
        for row in &group.variant_rows {
            let key = row.variant_key();
            let Some(&variant_id) = ids.get(&key) else {
                record_warning(
                    outcome,
                    WarningStep::VariantMatch,
                    format!("no variant matches '{}'", key.label()),
                );
                continue;
            };

            let mut patch = match variant_patch(row) {
                Ok(patch) => patch,
                Err(e) => {
                    record_warning(
                        outcome,
                        WarningStep::VariantUpdate,
                        format!("{}: {e}", key.label()),
                    );
                    continue;
                }
            };
            if let Some(url) = present(row.variant_image_url.as_ref()) {
                let dir = format!("{owner_id}/products/{product_id}/variants/{variant_id}");
                match self.store_image(url, &dir).await {
                    Ok(public_url) => patch.image_url = Some(public_url),
                    Err(e) => record_warning(
                        outcome,
                        WarningStep::VariantImage,
                        format!("{}: {url}: {e}", key.label()),
                    ),
                }
            }

            if patch.is_empty() {
                continue;
            }
            if let Err(e) = self.catalog.update_variant(variant_id, &patch).await {
                record_warning(
                    outcome,
                    WarningStep::VariantUpdate,
                    format!("{}: {e}", key.label()),
                );
            }
        }
    }

    /// Downloads `source_url` and uploads it under `dir`, returning the
    /// stored public URL.
    async fn store_image(&self, source_url: &str, dir: &str) -> Result<String, StoreError> {
        let image = self.images.fetch_remote(source_url).await?;
        let extension = extension_for(image.content_type.as_deref(), source_url);
        let path = format!("{dir}/{}", object_name(source_url, &extension));
        self.images.upload_image(&path, &image).await
    }
}

/// Product-level values read from a group's base row.
struct BaseValues {
    price: Decimal,
    /// Stock as written, before it moves onto the variants.
    stock: i32,
    weight: Option<Decimal>,
    status: ProductStatus,
}

impl BaseValues {
    fn from_row(name: &str, row: &InputRow) -> Result<Self, WriteError> {
        let invalid = |reason: String| WriteError::InvalidBaseRow {
            product: name.to_string(),
            reason,
        };

        let price = present(row.price.as_ref())
            .ok_or_else(|| invalid("price is missing".to_string()))
            .and_then(|raw| parse_price(raw).map_err(|e| invalid(format!("price {e}"))))?;
        let stock = present(row.stock.as_ref())
            .map(parse_count)
            .transpose()
            .map_err(|e| invalid(format!("stock {e}")))?
            .unwrap_or(0);
        let weight = present(row.weight.as_ref())
            .map(parse_weight)
            .transpose()
            .map_err(|e| invalid(format!("weight {e}")))?;
        let status = match present(row.status.as_ref()) {
            Some(raw) => raw.parse().map_err(|e: CoreError| invalid(e.to_string()))?,
            None => ProductStatus::default(),
        };

        Ok(Self {
            price,
            stock,
            weight,
            status,
        })
    }

    fn new_product(&self, owner_id: Uuid, name: &str, group: &ProductGroup) -> NewProduct {
        let row = &group.base_row;
        NewProduct {
            owner_id,
            name: name.to_string(),
            description: present(row.description.as_ref()).map(str::to_string),
            price: self.price,
            stock: if group.has_variants { 0 } else { self.stock },
            is_digital: flag(row.is_digital.as_ref()).unwrap_or(false),
            weight: self.weight,
            status: self.status,
            has_notes: flag(row.has_notes.as_ref()).unwrap_or(false),
            has_variants: group.has_variants,
        }
    }
}

/// Reads the override columns of a variant row. A cell that cannot be read
/// rejects the whole patch rather than being dropped.
fn variant_patch(row: &InputRow) -> Result<VariantPatch, String> {
    let price = present(row.variant_price.as_ref())
        .map(parse_price)
        .transpose()
        .map_err(|e| format!("variant_price {e}"))?;
    let stock = present(row.variant_stock.as_ref())
        .map(parse_count)
        .transpose()
        .map_err(|e| format!("variant_stock {e}"))?;
    let weight = present(row.variant_weight.as_ref())
        .map(parse_weight)
        .transpose()
        .map_err(|e| format!("variant_weight {e}"))?;

    Ok(VariantPatch {
        price,
        stock,
        weight,
        sku: present(row.variant_sku.as_ref()).map(str::to_string),
        is_active: flag(row.variant_is_active.as_ref()),
        description: present(row.variant_description.as_ref()).map(str::to_string),
        image_url: None,
    })
}

fn flag(raw: Option<&String>) -> Option<bool> {
    present(raw).and_then(parse_flag)
}

fn record_warning(outcome: &mut WriteOutcome, step: WarningStep, message: String) {
    tracing::warn!(
        product = %outcome.product_name,
        product_id = outcome.product_id,
        step = %step,
        error = %message,
        "product written with a warning"
    );
    outcome.warnings.push(ImportWarning { step, message });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: &str) -> InputRow {
        InputRow {
            product_name: Some("Mug".to_string()),
            price: Some(price.to_string()),
            ..InputRow::default()
        }
    }

    fn group(base_row: InputRow, has_variants: bool) -> ProductGroup {
        ProductGroup {
            product_name: "Mug".to_string(),
            base_row,
            variant_rows: Vec::new(),
            has_variants,
        }
    }

    #[test]
    fn base_values_strip_thousands_separators() {
        let base = BaseValues::from_row("Mug", &row("150,000")).unwrap();
        assert_eq!(base.price, Decimal::new(150_000, 0));
        assert_eq!(base.stock, 0);
        assert_eq!(base.status, ProductStatus::Active);
    }

    #[test]
    fn base_values_reject_missing_price() {
        let result = BaseValues::from_row("Mug", &InputRow::default());
        assert!(matches!(result, Err(WriteError::InvalidBaseRow { .. })));
    }

    #[test]
    fn new_product_forces_zero_stock_with_variants() {
        let base_row = InputRow {
            stock: Some("12".to_string()),
            is_digital: Some("TRUE".to_string()),
            weight: Some("0.5".to_string()),
            status: Some("draft".to_string()),
            ..row("10")
        };
        let base = BaseValues::from_row("Mug", &base_row).unwrap();

        let plain = base.new_product(Uuid::nil(), "Mug", &group(base_row.clone(), false));
        assert_eq!(plain.stock, 12);
        assert!(plain.is_digital);
        assert_eq!(plain.status, ProductStatus::Draft);
        assert_eq!(plain.weight, Some(Decimal::new(5, 1)));

        let with_variants = base.new_product(Uuid::nil(), "Mug", &group(base_row, true));
        assert_eq!(with_variants.stock, 0);
        assert!(with_variants.has_variants);
        assert_eq!(base.stock, 12);
    }

    #[test]
    fn variant_patch_reads_only_variant_columns() {
        let r = InputRow {
            stock: Some("99".to_string()),
            variant_price: Some("99,000".to_string()),
            variant_is_active: Some("false".to_string()),
            variant_sku: Some("MUG-RED".to_string()),
            ..row("10")
        };
        let patch = variant_patch(&r).unwrap();
        assert_eq!(patch.price, Some(Decimal::new(99_000, 0)));
        assert_eq!(patch.stock, None);
        assert_eq!(patch.is_active, Some(false));
        assert_eq!(patch.sku.as_deref(), Some("MUG-RED"));
        assert!(patch.image_url.is_none());
    }

    #[test]
    fn variant_patch_of_plain_row_is_empty() {
        assert!(variant_patch(&row("10")).unwrap().is_empty());
    }

    #[test]
    fn variant_patch_rejects_stock_beyond_integer_range() {
        let r = InputRow {
            variant_stock: Some("3000000000".to_string()),
            ..row("10")
        };
        let err = variant_patch(&r).unwrap_err();
        assert!(err.starts_with("variant_stock"), "{err}");
    }

    #[test]
    fn base_values_reject_stock_beyond_integer_range() {
        let base_row = InputRow {
            stock: Some("3000000000".to_string()),
            ..row("10")
        };
        match BaseValues::from_row("Mug", &base_row) {
            Err(WriteError::InvalidBaseRow { reason, .. }) => {
                assert!(reason.starts_with("stock"), "{reason}");
            }
            other => panic!("expected InvalidBaseRow, got {:?}", other.err()),
        }
    }

    #[test]
    fn warning_step_names() {
        assert_eq!(WarningStep::ProductImage.to_string(), "product_image");
        assert_eq!(WarningStep::VariantMatch.as_str(), "variant_match");
        let warning = ImportWarning {
            step: WarningStep::VariantUpdate,
            message: "Red: boom".to_string(),
        };
        assert_eq!(warning.to_string(), "variant_update: Red: boom");
    }
}
