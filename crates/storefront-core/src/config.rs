use crate::app_config::{AppConfig, Environment, StorageKeyKind};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the real environment so
/// tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let storage_url = require("SUPABASE_URL")?
        .trim_end_matches('/')
        .to_string();

    let (storage_key, storage_key_kind) = match require("SUPABASE_SERVICE_ROLE_KEY") {
        Ok(key) => (key, StorageKeyKind::ServiceRole),
        Err(_) => match require("SUPABASE_ANON_KEY") {
            Ok(key) => (key, StorageKeyKind::Anon),
            Err(_) => {
                return Err(ConfigError::MissingEnvVar(
                    "SUPABASE_SERVICE_ROLE_KEY or SUPABASE_ANON_KEY".to_string(),
                ))
            }
        },
    };

    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"))?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");
    let image_bucket = or_default("STOREFRONT_IMAGE_BUCKET", "product-images");

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_timeout_secs = parse_u64("STOREFRONT_HTTP_TIMEOUT_SECS", "30")?;
    let http_user_agent = or_default("STOREFRONT_HTTP_USER_AGENT", "storefront-import/0.1");
    let http_max_retries = parse_u32("STOREFRONT_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_secs = parse_u64("STOREFRONT_HTTP_RETRY_BACKOFF_BASE_SECS", "1")?;

    let import_delay_ms = parse_u64("STOREFRONT_IMPORT_DELAY_MS", "100")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        storage_url,
        storage_key,
        storage_key_kind,
        image_bucket,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        http_user_agent,
        http_max_retries,
        http_retry_backoff_base_secs,
        import_delay_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
