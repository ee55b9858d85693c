//! Row Grouper.

use std::collections::HashMap;

use crate::expand::{expand, VariantCombination};
use crate::input::{InputRow, ParsedRow};
use crate::tiers::{build_tiers, VariantTier};

/// Everything the import file says about one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductGroup {
    /// Trimmed product name shared by every row of the group.
    pub product_name: String,
    /// Row supplying product-level attributes.
    pub base_row: InputRow,
    /// Rows carrying at least one tier value, in file order.
    pub variant_rows: Vec<InputRow>,
    pub has_variants: bool,
}

impl ProductGroup {
    #[must_use]
    pub fn tiers(&self) -> Vec<VariantTier> {
        build_tiers(&self.variant_rows)
    }

    #[must_use]
    pub fn combinations(&self) -> Vec<VariantCombination> {
        expand(&self.product_name, &self.tiers())
    }
}

/// Groups valid rows by product name, keeping first-seen order.
///
/// Rows with validation errors are skipped. The first row of a product seeds
/// its base row; the first row without tier values then takes over, and any
/// later plain rows for the same product are ignored.
#[must_use]
pub fn group_rows(rows: &[ParsedRow]) -> Vec<ProductGroup> {
    let mut groups: Vec<ProductGroup> = Vec::new();
    // Whether each group's base row came from a row without tier values.
    let mut base_is_plain: Vec<bool> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for parsed in rows.iter().filter(|r| r.is_valid()) {
        let row = &parsed.row;
        let name = row.name();
        let has_variant_data = row.has_variant_data();

        let Some(&idx) = index.get(name) else {
            index.insert(name.to_string(), groups.len());
            groups.push(ProductGroup {
                product_name: name.to_string(),
                base_row: row.clone(),
                variant_rows: if has_variant_data {
                    vec![row.clone()]
                } else {
                    Vec::new()
                },
                has_variants: has_variant_data,
            });
            base_is_plain.push(!has_variant_data);
            continue;
        };

        let group = &mut groups[idx];
        if has_variant_data {
            group.variant_rows.push(row.clone());
            group.has_variants = true;
        } else if !base_is_plain[idx] {
            group.base_row = row.clone();
            base_is_plain[idx] = true;
        }
    }

    groups
}
