//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `GREENBASKET_DELIVERY_FEE` - Flat delivery fee in major units (default: 10)
//! - `GREENBASKET_ORDER_TIMEOUT_SECS` - Timeout for the order service call (default: 30)
//! - `GREENBASKET_CURRENCY` - ISO 4217 code for all amounts (default: GHS)

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use greenbasket_core::{CurrencyCode, Money};

const DEFAULT_DELIVERY_FEE_MAJOR: i64 = 10;
const DEFAULT_ORDER_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront engine configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Flat fee added to every order. No dynamic pricing, no tax line.
    pub delivery_fee: Money,
    /// How long to wait on the order service before giving up.
    pub order_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let currency = match std::env::var("GREENBASKET_CURRENCY") {
            Ok(raw) => raw
                .parse::<CurrencyCode>()
                .map_err(|e| ConfigError::InvalidEnvVar("GREENBASKET_CURRENCY".to_string(), e))?,
            Err(_) => CurrencyCode::default(),
        };

        let delivery_fee = match std::env::var("GREENBASKET_DELIVERY_FEE") {
            Ok(raw) => {
                let amount = raw.parse::<Decimal>().map_err(|e| {
                    ConfigError::InvalidEnvVar("GREENBASKET_DELIVERY_FEE".to_string(), e.to_string())
                })?;
                if amount.is_sign_negative() {
                    return Err(ConfigError::InvalidEnvVar(
                        "GREENBASKET_DELIVERY_FEE".to_string(),
                        "must not be negative".to_string(),
                    ));
                }
                Money::new(amount, currency)
            }
            Err(_) => Money::from_major(DEFAULT_DELIVERY_FEE_MAJOR, currency),
        };

        let order_timeout = match std::env::var("GREENBASKET_ORDER_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "GREENBASKET_ORDER_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_ORDER_TIMEOUT_SECS),
        };

        Ok(Self {
            delivery_fee,
            order_timeout,
        })
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            delivery_fee: Money::from_major(DEFAULT_DELIVERY_FEE_MAJOR, CurrencyCode::default()),
            order_timeout: Duration::from_secs(DEFAULT_ORDER_TIMEOUT_SECS),
        }
    }
}
