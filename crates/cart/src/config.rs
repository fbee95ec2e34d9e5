//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PANTRY_CART_DIR` - Directory holding persisted carts (default: .pantry)
//! - `PANTRY_CART_KEY` - Storage key of the session cart (default: pantry.cart)
//! - `PANTRY_CART_DEBOUNCE_MS` - Persistence write debounce window (default: 250)
//! - `PANTRY_CURRENCY` - ISO 4217 code used for totals (default: USD)
//! - `PANTRY_MAX_LINE_QUANTITY` - Upper bound on a single line's quantity (default: unbounded)

use std::path::PathBuf;
use std::time::Duration;

use pantry_core::CurrencyCode;
use thiserror::Error;

/// Default storage key for the session cart.
pub const DEFAULT_CART_KEY: &str = "pantry.cart";

const DEFAULT_CART_DIR: &str = ".pantry";
const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory used by file-backed storage
    pub storage_dir: PathBuf,
    /// Storage key the cart snapshot is saved under
    pub storage_key: String,
    /// Delay used to coalesce rapid successive writes
    pub debounce: Duration,
    /// Currency the cart totals are reported in
    pub currency: CurrencyCode,
    /// Optional upper bound on a single line's quantity
    pub max_line_quantity: Option<u32>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_CART_DIR),
            storage_key: DEFAULT_CART_KEY.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            currency: CurrencyCode::default(),
            max_line_quantity: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_dir = lookup("PANTRY_CART_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_CART_DIR), PathBuf::from);

        let storage_key =
            lookup("PANTRY_CART_KEY").unwrap_or_else(|| DEFAULT_CART_KEY.to_string());
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "PANTRY_CART_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let debounce_ms = lookup("PANTRY_CART_DEBOUNCE_MS")
            .map(|value| parse_var::<u64>("PANTRY_CART_DEBOUNCE_MS", &value))
            .transpose()?
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let currency = lookup("PANTRY_CURRENCY")
            .map(|value| parse_var::<CurrencyCode>("PANTRY_CURRENCY", &value))
            .transpose()?
            .unwrap_or_default();

        let max_line_quantity = lookup("PANTRY_MAX_LINE_QUANTITY")
            .map(|value| parse_var::<u32>("PANTRY_MAX_LINE_QUANTITY", &value))
            .transpose()?;
        if max_line_quantity == Some(0) {
            return Err(ConfigError::InvalidEnvVar(
                "PANTRY_MAX_LINE_QUANTITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            storage_dir,
            storage_key,
            debounce: Duration::from_millis(debounce_ms),
            currency,
            max_line_quantity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable value, mapping failures to `ConfigError::InvalidEnvVar`.
fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
