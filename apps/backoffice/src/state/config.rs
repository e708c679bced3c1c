//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no lock is needed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use stockroom_core::{PricingPolicy, DEFAULT_REORDER_LEVEL};
use stockroom_db::DbConfig;
use thiserror::Error;

/// Default log filter when neither `RUST_LOG` nor `STOCKROOM_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,stockroom=debug,sqlx=warn";

/// A configuration value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Upper bound of the connection pool.
    pub max_connections: u32,

    /// Store name (report headers)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Reorder level of new products that do not name one.
    pub default_reorder_level: i64,

    /// Floor bill totals at zero when a flat discount exceeds subtotal + tax.
    pub clamp_negative_total: bool,

    /// `tracing` filter directive.
    pub log_filter: String,
}

impl Default for AppConfig {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Database: `stockroom.db` in the working directory
    /// - Currency: `$`, 2 decimals
    /// - Reorder level: 10
    /// - Totals: unclamped
    fn default() -> Self {
        AppConfig {
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 5,
            store_name: "Stockroom".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_reorder_level: DEFAULT_REORDER_LEVEL,
            clamp_negative_total: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// ## Environment Variables
    /// - `STOCKROOM_DB_PATH`: database file
    /// - `STOCKROOM_MAX_CONNECTIONS`: pool size (≥ 1)
    /// - `STOCKROOM_STORE_NAME`: store name
    /// - `STOCKROOM_CURRENCY_SYMBOL`: currency symbol
    /// - `STOCKROOM_DEFAULT_REORDER_LEVEL`: reorder level of new products (≥ 0)
    /// - `STOCKROOM_CLAMP_NEGATIVE_TOTAL`: `true`/`false`/`1`/`0`
    /// - `STOCKROOM_LOG`: log filter (`RUST_LOG` still wins)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("STOCKROOM_MAX_CONNECTIONS") {
            let max = raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid("STOCKROOM_MAX_CONNECTIONS", &raw, e.to_string()))?;
            if max == 0 {
                return Err(ConfigError::invalid("STOCKROOM_MAX_CONNECTIONS", &raw, "must be at least 1"));
            }
            config.max_connections = max;
        }

        if let Some(name) = lookup("STOCKROOM_STORE_NAME") {
            config.store_name = name;
        }

        if let Some(symbol) = lookup("STOCKROOM_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("STOCKROOM_DEFAULT_REORDER_LEVEL") {
            let level = raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::invalid("STOCKROOM_DEFAULT_REORDER_LEVEL", &raw, e.to_string())
            })?;
            if level < 0 {
                return Err(ConfigError::invalid(
                    "STOCKROOM_DEFAULT_REORDER_LEVEL",
                    &raw,
                    "must not be negative",
                ));
            }
            config.default_reorder_level = level;
        }

        if let Some(raw) = lookup("STOCKROOM_CLAMP_NEGATIVE_TOTAL") {
            config.clamp_negative_total = parse_flag("STOCKROOM_CLAMP_NEGATIVE_TOTAL", &raw)?;
        }

        if let Some(filter) = lookup("STOCKROOM_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Pricing decisions taken from configuration.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            clamp_negative_total: self.clamp_negative_total,
        }
    }

    /// Pool settings for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_backoffice::AppConfig;
    ///
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}

fn parse_flag(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, raw, "expected true or false")),
    }
}
