pub mod app_config;
pub mod catalog;
pub mod config;
pub mod records;

pub use app_config::{AppConfig, Environment, StorageKeyKind};
pub use catalog::{ProductStatus, VariantKey, MAX_TIERS};
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{NewProduct, NewVariant, NewVariantOption, StoredVariant, VariantPatch};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid product status: {0}")]
    InvalidStatus(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
