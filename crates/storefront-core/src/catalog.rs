use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Number of variant tiers a product may declare (e.g. Color, Size, Material).
pub const MAX_TIERS: usize = 3;

/// Publication status of a product in the storefront.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    Draft,
}

impl ProductStatus {
    /// The lowercase string stored in the `products.status` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = CoreError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "draft" => Ok(ProductStatus::Draft),
            _ => Err(CoreError::InvalidStatus(s.to_string())),
        }
    }
}

/// The tier values that identify one purchasable variant.
///
/// Used to match a variant row from an import file against the persisted
/// combination it describes. Values are stored trimmed; an empty value is
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    pub tier1: Option<String>,
    pub tier2: Option<String>,
    pub tier3: Option<String>,
}

impl VariantKey {
    /// Builds a key from raw tier values, trimming each and dropping empties.
    #[must_use]
    pub fn from_raw(tier1: Option<&str>, tier2: Option<&str>, tier3: Option<&str>) -> Self {
        fn clean(v: Option<&str>) -> Option<String> {
            v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
        }
        Self {
            tier1: clean(tier1),
            tier2: clean(tier2),
            tier3: clean(tier3),
        }
    }

    /// Tier values in level order, including absent levels.
    #[must_use]
    pub fn values(&self) -> [Option<&str>; MAX_TIERS] {
        [
            self.tier1.as_deref(),
            self.tier2.as_deref(),
            self.tier3.as_deref(),
        ]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    /// Human-readable label, e.g. `"Red / L"`.
    #[must_use]
    pub fn label(&self) -> String {
        self.values()
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ")
    }
}
