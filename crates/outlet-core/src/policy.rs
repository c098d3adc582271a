//! # Transaction Policy
//!
//! Stateless rules binding a channel to its store type, payment mode, and
//! inventory pool.
//!
//! ```text
//! ┌──────────┬────────────┬──────────────────────┬──────────────┐
//! │ Channel  │ Store type │ Cash rule            │ Pool         │
//! ├──────────┼────────────┼──────────────────────┼──────────────┤
//! │ COUNTER  │ STORE      │ cash > 0             │ STORE        │
//! │ ONLINE   │ WEBSITE    │ cash == 0 (COD)      │ WEBSITE      │
//! └──────────┴────────────┴──────────────────────┴──────────────┘
//! ```
//!
//! The counter rule here only checks sign; `cash >= total` is enforced by
//! the session, which knows the total.
//!
//! Online orders also carry a flat shipping surcharge, see [`ShippingRule`].

use crate::config::OutletConfig;
use crate::money::Money;
use crate::types::{Channel, PoolKind, StoreType};

/// COUNTER → STORE, ONLINE → WEBSITE.
pub const fn store_type_for(channel: Channel) -> StoreType {
    match channel {
        Channel::Counter => StoreType::Store,
        Channel::Online => StoreType::Website,
    }
}

/// The only pool a channel may allocate from.
pub const fn pool_for(channel: Channel) -> PoolKind {
    match channel {
        Channel::Counter => PoolKind::Store,
        Channel::Online => PoolKind::Website,
    }
}

pub fn is_cash_valid(channel: Channel, cash: Money) -> bool {
    match channel {
        Channel::Counter => cash.is_positive(),
        Channel::Online => cash.is_zero(),
    }
}

pub fn can_access_pool(channel: Channel, pool: PoolKind) -> bool {
    pool_for(channel) == pool
}

// =============================================================================
// Shipping
// =============================================================================

/// Flat online shipping fee, waived at or above a post-discount threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRule {
    pub fee: Money,
    pub free_threshold: Money,
}

impl ShippingRule {
    pub fn from_config(config: &OutletConfig) -> Self {
        ShippingRule {
            fee: config.shipping_fee,
            free_threshold: config.free_shipping_threshold,
        }
    }

    /// Shipping for an order whose post-discount total is `total`.
    /// Counter sales never ship.
    pub fn fee_for(&self, channel: Channel, total: Money) -> Money {
        match channel {
            Channel::Counter => Money::zero(),
            Channel::Online if total >= self.free_threshold => Money::zero(),
            Channel::Online => self.fee,
        }
    }
}

impl Default for ShippingRule {
    fn default() -> Self {
        Self::from_config(&OutletConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_type_binding() {
        assert_eq!(store_type_for(Channel::Counter), StoreType::Store);
        assert_eq!(store_type_for(Channel::Online), StoreType::Website);
    }

    #[test]
    fn test_cash_rules() {
        assert!(is_cash_valid(Channel::Counter, Money::from_cents(1)));
        assert!(!is_cash_valid(Channel::Counter, Money::zero()));
        assert!(!is_cash_valid(Channel::Counter, Money::from_cents(-100)));

        assert!(is_cash_valid(Channel::Online, Money::zero()));
        assert!(!is_cash_valid(Channel::Online, Money::from_cents(500)));
    }

    #[test]
    fn test_pool_access_is_exclusive() {
        assert!(can_access_pool(Channel::Counter, PoolKind::Store));
        assert!(!can_access_pool(Channel::Counter, PoolKind::Website));
        assert!(can_access_pool(Channel::Online, PoolKind::Website));
        assert!(!can_access_pool(Channel::Online, PoolKind::Store));
    }

    #[test]
    fn test_shipping_waived_at_threshold() {
        let rule = ShippingRule::default();

        assert_eq!(rule.fee_for(Channel::Online, Money::from_cents(4000)).cents(), 599);
        assert_eq!(rule.fee_for(Channel::Online, Money::from_cents(5000)).cents(), 0);
        assert_eq!(rule.fee_for(Channel::Counter, Money::from_cents(100)).cents(), 0);
    }
}
