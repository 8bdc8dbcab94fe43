//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BAZAAR_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use bazaar_core::{Money, TaxRate, DEFAULT_PAGE_SIZE, TAX_RATE};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (shown in the header)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Tax rate applied to every cart, in basis points
    /// e.g., 1000 = 10%
    pub tax_rate_bps: u32,

    /// Rows per page in the admin inventory table
    pub page_size: usize,
}

impl Default for ConfigState {
    /// Returns default configuration.
    ///
    /// ## Default Values
    /// - Store: "Bazaar"
    /// - Currency: ₹
    /// - Tax: 10%
    /// - Inventory page size: 10
    fn default() -> Self {
        ConfigState {
            store_name: "Bazaar".to_string(),
            currency_symbol: "₹".to_string(),
            tax_rate_bps: TAX_RATE.bps(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `BAZAAR_STORE_NAME`: Override store name
    /// - `BAZAAR_CURRENCY_SYMBOL`: Override currency symbol
    /// - `BAZAAR_TAX_RATE`: Override tax rate in percent (e.g., "10")
    /// - `BAZAAR_PAGE_SIZE`: Override inventory page size
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = ConfigState::default();

        if let Ok(store_name) = std::env::var("BAZAAR_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Ok(symbol) = std::env::var("BAZAAR_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Ok(tax_rate_str) = std::env::var("BAZAAR_TAX_RATE") {
            if let Ok(rate) = tax_rate_str.trim().parse::<f64>() {
                if (0.0..=100.0).contains(&rate) {
                    config.tax_rate_bps = TaxRate::from_percentage(rate).bps();
                }
            }
        }

        if let Ok(page_size) = std::env::var("BAZAAR_PAGE_SIZE") {
            if let Ok(size) = page_size.trim().parse::<usize>() {
                if size > 0 {
                    config.page_size = size;
                }
            }
        }

        config
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Formats an amount with two decimals and the currency symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_amount(990.0)), "₹990.00");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let rounded = amount.rounded();
        format!(
            "{}{}{:.2}",
            if rounded < 0.0 { "-" } else { "" },
            self.currency_symbol,
            rounded.abs()
        )
    }
}
