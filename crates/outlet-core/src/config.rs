//! # Outlet Configuration
//!
//! Business constants loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`OUTLET_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization and is handed to the
//! facades and report functions by value or reference; there is no global.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::money::Money;

/// Default low-stock / reorder threshold (units).
pub const DEFAULT_REORDER_THRESHOLD: i64 = 50;

/// Batches expiring within this many days are allocated first.
pub const DEFAULT_URGENCY_WINDOW_DAYS: i64 = 30;

/// Online orders at or above this post-discount subtotal ship free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(5000);

/// Flat online shipping fee.
pub const DEFAULT_SHIPPING_FEE: Money = Money::from_cents(599);

/// Outlet configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletConfig {
    /// Printed at the top of receipts.
    pub store_name: String,

    /// Symbol used when rendering amounts in receipts and reports.
    pub currency_symbol: String,

    /// Aggregate quantity at or below which an item is "low stock".
    pub reorder_threshold: i64,

    pub free_shipping_threshold: Money,

    pub shipping_fee: Money,

    /// Width of the expiry urgency bucket used by allocation.
    pub urgency_window_days: i64,

    /// Prepended to every invoice serial.
    pub invoice_prefix: String,
}

impl Default for OutletConfig {
    fn default() -> Self {
        OutletConfig {
            store_name: "Synex Outlet Store".to_string(),
            currency_symbol: "Rs.".to_string(),
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            shipping_fee: DEFAULT_SHIPPING_FEE,
            urgency_window_days: DEFAULT_URGENCY_WINDOW_DAYS,
            invoice_prefix: String::new(),
        }
    }
}

impl OutletConfig {
    /// Creates a configuration from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `OUTLET_STORE_NAME`
    /// - `OUTLET_CURRENCY_SYMBOL`
    /// - `OUTLET_REORDER_THRESHOLD`
    /// - `OUTLET_FREE_SHIPPING_THRESHOLD_CENTS`
    /// - `OUTLET_SHIPPING_FEE_CENTS`
    /// - `OUTLET_URGENCY_WINDOW_DAYS`
    /// - `OUTLET_INVOICE_PREFIX`
    ///
    /// Values that fail to parse keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary key source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = OutletConfig::default();

        if let Some(name) = lookup("OUTLET_STORE_NAME") {
            config.store_name = name;
        }
        if let Some(symbol) = lookup("OUTLET_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }
        if let Some(prefix) = lookup("OUTLET_INVOICE_PREFIX") {
            config.invoice_prefix = prefix;
        }
        if let Some(v) = parsed::<i64>(&lookup, "OUTLET_REORDER_THRESHOLD") {
            config.reorder_threshold = v;
        }
        if let Some(v) = parsed::<i64>(&lookup, "OUTLET_FREE_SHIPPING_THRESHOLD_CENTS") {
            config.free_shipping_threshold = Money::from_cents(v);
        }
        if let Some(v) = parsed::<i64>(&lookup, "OUTLET_SHIPPING_FEE_CENTS") {
            config.shipping_fee = Money::from_cents(v);
        }
        if let Some(v) = parsed::<i64>(&lookup, "OUTLET_URGENCY_WINDOW_DAYS") {
            config.urgency_window_days = v;
        }

        config
    }

    /// Formats an amount with the configured currency symbol.
    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| raw.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_business_rules() {
        let config = OutletConfig::default();
        assert_eq!(config.reorder_threshold, 50);
        assert_eq!(config.free_shipping_threshold.cents(), 5000);
        assert_eq!(config.shipping_fee.cents(), 599);
        assert_eq!(config.urgency_window_days, 30);
        assert!(config.invoice_prefix.is_empty());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OUTLET_STORE_NAME", "Test Outlet"),
            ("OUTLET_SHIPPING_FEE_CENTS", "799"),
            ("OUTLET_REORDER_THRESHOLD", " 20 "),
            ("OUTLET_INVOICE_PREFIX", "INV-"),
        ]
        .into_iter()
        .collect();

        let config = OutletConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.store_name, "Test Outlet");
        assert_eq!(config.shipping_fee.cents(), 799);
        assert_eq!(config.reorder_threshold, 20);
        assert_eq!(config.invoice_prefix, "INV-");
        assert_eq!(config.urgency_window_days, 30);
    }

    #[test]
    fn test_unparseable_value_keeps_default() {
        let config = OutletConfig::from_lookup(|k| {
            (k == "OUTLET_URGENCY_WINDOW_DAYS").then(|| "soon".to_string())
        });
        assert_eq!(config.urgency_window_days, DEFAULT_URGENCY_WINDOW_DAYS);
    }

    #[test]
    fn test_format_money() {
        let config = OutletConfig::default();
        assert_eq!(config.format_money(Money::from_cents(1802)), "Rs.18.02");
    }
}
