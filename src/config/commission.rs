//! Commission configuration loading from config.toml
//!
//! The `[commission]` table sets the farmer and trader rates used when no
//! `system_settings` override is present. Rates are written as quoted decimal
//! strings so they parse exactly:
//!
//! ```toml
//! [commission]
//! farmer_rate = "0.04"
//! trader_rate = "0.09"
//! ```

use crate::core::settlement::CommissionRates;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Commission rates; defaults apply when the table is absent
    #[serde(default)]
    pub commission: CommissionConfig,
}

/// The `[commission]` table
#[derive(Debug, Deserialize, Clone)]
pub struct CommissionConfig {
    /// Fraction deducted from the farmer's side
    pub farmer_rate: Decimal,
    /// Fraction added to the trader's side
    pub trader_rate: Decimal,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        let rates = CommissionRates::default();
        Self {
            farmer_rate: rates.farmer(),
            trader_rate: rates.trader(),
        }
    }
}

impl CommissionConfig {
    /// Validates the configured rates.
    ///
    /// # Errors
    /// Returns `Error::InvalidRate` if either rate is outside `[0, 1)`.
    pub fn rates(&self) -> Result<CommissionRates> {
        CommissionRates::new(self.farmer_rate, self.trader_rate)
    }
}

/// Loads commission configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A rate is not a decimal
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the default location (./config.toml).
///
/// A missing file is not an error; the built-in 4%/9% rates are used instead.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::info!("No config.toml found, using default commission rates");
        return Ok(Config::default());
    }
    load_config(path)
}
