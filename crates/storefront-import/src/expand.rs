//! Variant Combination Expander.

use storefront_core::VariantKey;

use crate::tiers::VariantTier;

/// One concrete assignment of a value to every tier of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCombination {
    pub key: VariantKey,
    /// Base name followed by each tier value in level order, e.g.
    /// `"Shirt Red L"`.
    pub full_name: String,
}

/// Cartesian product of `tiers`, named after `base_name`.
///
/// Output order is nested iteration with the lowest level outermost, each
/// level in its option order. With no tiers the result is a single
/// combination carrying just `base_name`.
#[must_use]
pub fn expand(base_name: &str, tiers: &[VariantTier]) -> Vec<VariantCombination> {
    let mut sorted: Vec<&VariantTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.level);

    let mut out = Vec::new();
    let mut chosen: Vec<(u8, &str)> = Vec::with_capacity(sorted.len());
    expand_into(base_name, &sorted, &mut chosen, &mut out);
    out
}

fn expand_into<'a>(
    base_name: &str,
    remaining: &[&'a VariantTier],
    chosen: &mut Vec<(u8, &'a str)>,
    out: &mut Vec<VariantCombination>,
) {
    let Some((&tier, rest)) = remaining.split_first() else {
        out.push(combination(base_name, chosen));
        return;
    };
    for option in &tier.options {
        chosen.push((tier.level, option.as_str()));
        expand_into(base_name, rest, chosen, out);
        chosen.pop();
    }
}

fn combination(base_name: &str, chosen: &[(u8, &str)]) -> VariantCombination {
    let pick = |level: u8| {
        chosen
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, value)| *value)
    };
    let key = VariantKey::from_raw(pick(1), pick(2), pick(3));

    let mut full_name = base_name.to_string();
    for (_, value) in chosen {
        full_name.push(' ');
        full_name.push_str(value);
    }

    VariantCombination { key, full_name }
}
