//! # Domain Types
//!
//! Core domain types used throughout the outlet.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │   StockBatch    │   │    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code           │   │  id (UUID)      │   │  item_code      │       │
//! │  │  name           │   │  item_code      │   │  item_name      │       │
//! │  │  price          │   │  current_qty    │   │  unit_price     │       │
//! │  └─────────────────┘   │  expiry_date    │   │  quantity       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Channel      │   │   StoreType     │   │    PoolKind     │       │
//! │  │  COUNTER        │──►│  STORE          │   │  STORE          │       │
//! │  │  ONLINE         │──►│  WEBSITE        │   │  WEBSITE        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Bill: immutable snapshot of a committed checkout                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Channel / Store Type / Pool
// =============================================================================

/// The sale path a checkout runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Channel {
    /// In-person sale at the store counter, paid in cash.
    Counter,
    /// Web storefront order, cash on delivery.
    Online,
}

impl Channel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Counter => "COUNTER",
            Channel::Online => "ONLINE",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COUNTER" => Ok(Channel::Counter),
            "ONLINE" => Ok(Channel::Online),
            _ => Err(ValidationError::NotAllowed {
                field: "channel".to_string(),
                allowed: vec!["COUNTER".to_string(), "ONLINE".to_string()],
            }),
        }
    }
}

/// Store type recorded on a bill. Always derived from the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum StoreType {
    Store,
    Website,
}

impl StoreType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            StoreType::Store => "STORE",
            StoreType::Website => "WEBSITE",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory pool a ledger holds. Each channel may touch exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolKind {
    Store,
    Website,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolKind::Store => f.write_str("STORE"),
            PoolKind::Website => f.write_str("WEBSITE"),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// A catalog item. Administered outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Business identifier, e.g. `ITEM001`.
    pub code: String,
    pub name: String,
    /// Unit price, never negative.
    pub price: Money,
}

impl Item {
    pub fn new(code: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Item {
            code: code.into(),
            name: name.into(),
            price,
        }
    }
}

// =============================================================================
// Stock Batch
// =============================================================================

/// A quantity of one item received at one time.
///
/// Batches are never deleted: a batch whose `current_quantity` reaches zero
/// stays in its pool as an exhausted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: String,
    pub item_code: String,
    pub item_name: String,
    pub original_quantity: i64,
    pub current_quantity: i64,
    pub purchase_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl StockBatch {
    /// Creates a fresh batch with `current_quantity == original_quantity`.
    pub fn new(
        item: &Item,
        quantity: i64,
        purchase_date: NaiveDate,
        expiry_date: NaiveDate,
    ) -> Self {
        StockBatch {
            id: uuid::Uuid::new_v4().to_string(),
            item_code: item.code.clone(),
            item_name: item.name.clone(),
            original_quantity: quantity,
            current_quantity: quantity,
            purchase_date,
            expiry_date,
        }
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.current_quantity > 0
    }

    /// Days from `today` until expiry; negative once expired.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line in a checkout. Uses the snapshot pattern: code, name, and price
/// are frozen when the item is first added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub item_code: String,
    pub item_name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl LineItem {
    pub fn from_item(item: &Item, quantity: i64) -> Self {
        LineItem {
            item_code: item.code.clone(),
            item_name: item.name.clone(),
            unit_price: item.price,
            quantity,
            line_total: item.price.multiply_quantity(quantity),
        }
    }

    /// Adds to the quantity and recomputes the total at the frozen price.
    pub fn increase(&mut self, quantity: i64) {
        self.quantity = self.quantity.saturating_add(quantity);
        self.line_total = self.unit_price.multiply_quantity(self.quantity);
    }
}

// =============================================================================
// Bill
// =============================================================================

/// Every field of a bill, used to restore one from storage.
#[derive(Debug, Clone)]
pub struct BillParts {
    pub invoice_number: String,
    pub channel: Channel,
    pub lines: Vec<LineItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub shipping_fee: Money,
    pub cash_tendered: Money,
    pub change: Money,
    pub created_at: DateTime<Utc>,
}

/// The immutable record of a committed checkout.
///
/// Fields are private: a bill is produced once by
/// [`BillAssembler`](crate::bill::BillAssembler) and then only read.
/// `store_type` is derived from `channel` and not stored separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bill {
    invoice_number: String,
    channel: Channel,
    store_type: StoreType,
    lines: Vec<LineItem>,
    subtotal: Money,
    discount: Money,
    /// Σ line totals − discount. Shipping is not included.
    total: Money,
    /// Online shipping surcharge shown to the customer; zero at the counter.
    shipping_fee: Money,
    cash_tendered: Money,
    change: Money,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Bill {
    pub(crate) fn from_parts(parts: BillParts) -> Self {
        Bill {
            store_type: crate::policy::store_type_for(parts.channel),
            invoice_number: parts.invoice_number,
            channel: parts.channel,
            lines: parts.lines,
            subtotal: parts.subtotal,
            discount: parts.discount,
            total: parts.total,
            shipping_fee: parts.shipping_fee,
            cash_tendered: parts.cash_tendered,
            change: parts.change,
            created_at: parts.created_at,
        }
    }

    /// Rebuilds a previously persisted bill.
    pub fn restore(parts: BillParts) -> Self {
        Self::from_parts(parts)
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn shipping_fee(&self) -> Money {
        self.shipping_fee
    }

    /// What the customer pays: `total + shipping_fee`.
    pub fn grand_total(&self) -> Money {
        self.total + self.shipping_fee
    }

    pub fn cash_tendered(&self) -> Money {
        self.cash_tendered
    }

    pub fn change(&self) -> Money {
        self.change
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_channel_round_trips_through_str() {
        assert_eq!("COUNTER".parse::<Channel>().unwrap(), Channel::Counter);
        assert_eq!("ONLINE".parse::<Channel>().unwrap(), Channel::Online);
        assert!("counter".parse::<Channel>().is_err());
        assert_eq!(Channel::Online.to_string(), "ONLINE");
    }

    #[test]
    fn test_channel_serializes_screaming_case() {
        let json = serde_json::to_string(&Channel::Counter).unwrap();
        assert_eq!(json, "\"COUNTER\"");
    }

    #[test]
    fn test_line_item_freezes_price() {
        let mut item = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let mut line = LineItem::from_item(&item, 2);

        item.price = Money::from_cents(9999);
        line.increase(1);

        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price.cents(), 1599);
        assert_eq!(line.line_total.cents(), 4797);
    }

    #[test]
    fn test_batch_availability_and_expiry() {
        let item = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let mut batch = StockBatch::new(&item, 5, date(2026, 1, 1), date(2026, 1, 31));

        assert!(batch.is_available());
        assert_eq!(batch.days_until_expiry(date(2026, 1, 29)), 2);
        assert_eq!(batch.days_until_expiry(date(2026, 2, 2)), -2);

        batch.current_quantity = 0;
        assert!(!batch.is_available());
        assert_eq!(batch.original_quantity, 5);
    }

    #[test]
    fn test_bill_store_type_follows_channel() {
        let bill = Bill::restore(BillParts {
            invoice_number: "7".to_string(),
            channel: Channel::Online,
            lines: vec![],
            subtotal: Money::from_cents(4000),
            discount: Money::zero(),
            total: Money::from_cents(4000),
            shipping_fee: Money::from_cents(599),
            cash_tendered: Money::zero(),
            change: Money::zero(),
            created_at: Utc::now(),
        });

        assert_eq!(bill.store_type(), StoreType::Website);
        assert_eq!(bill.grand_total().cents(), 4599);
    }
}
