//! Variant Tier Builder.

use storefront_core::MAX_TIERS;

use crate::input::InputRow;

/// One axis of variation for a product, e.g. level 1 "Color" with options
/// `["Red", "Blue"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTier {
    /// 1, 2 or 3.
    pub level: u8,
    pub name: String,
    /// Distinct values in the order they first appear.
    pub options: Vec<String>,
}

/// Collects the tiers used by a product's variant rows.
///
/// For each level the name comes from the first row that supplies one; rows
/// are not checked for agreeing on it. Options are the distinct values seen
/// at that level. A level ends up in the result only if it has both a name
/// and at least one value, and the result is sorted by level.
#[must_use]
pub fn build_tiers(variant_rows: &[InputRow]) -> Vec<VariantTier> {
    let mut names: [Option<&str>; MAX_TIERS] = [None; MAX_TIERS];
    let mut options: [Vec<String>; MAX_TIERS] = Default::default();

    for row in variant_rows {
        for (idx, (name, value)) in row.tier_slots().into_iter().enumerate() {
            if names[idx].is_none() {
                names[idx] = name;
            }
            if let Some(value) = value {
                if !options[idx].iter().any(|o| o == value) {
                    options[idx].push(value.to_string());
                }
            }
        }
    }

    names
        .into_iter()
        .zip(options)
        .enumerate()
        .filter_map(|(idx, (name, options))| {
            let name = name?;
            (!options.is_empty()).then(|| VariantTier {
                level: level_of(idx),
                name: name.to_string(),
                options,
            })
        })
        .collect()
}

fn level_of(idx: usize) -> u8 {
    match idx {
        0 => 1,
        1 => 2,
        _ => 3,
    }
}
