//! # Reports
//!
//! Plain functions from data to a report value. Every report implements
//! `Display` for the text form printed at the back office.
//!
//! | Function          | Input                    | Output              |
//! |-------------------|--------------------------|---------------------|
//! | `daily_sales`     | bills, date              | `DailySalesReport`  |
//! | `bill_transactions` | bills, from, to        | `BillTransactionReport` |
//! | `reorder_report`  | ledger, threshold        | `ReorderReport`     |
//! | `stock_report`    | ledger, threshold        | `StockReport`       |
//! | `render_bill`     | bill                     | receipt `String`    |

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::OutletConfig;
use crate::ledger::{InventoryLedger, LowStockItem};
use crate::money::Money;
use crate::types::{Bill, Channel, PoolKind, StockBatch};

const RULE: &str = "===============================";
const THIN_RULE: &str = "---------------------------------------------------------------";

// =============================================================================
// Daily Sales
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySalesReport {
    pub date: NaiveDate,
    pub bills: Vec<Bill>,
    pub transaction_count: usize,
    pub total_sales: Money,
    pub total_discount: Money,
    /// Zero when there were no sales.
    pub average_sale: Money,
    currency_symbol: String,
}

/// Bills created on `date` (UTC), with totals. Shipping is not counted as
/// sales.
pub fn daily_sales(bills: &[Bill], date: NaiveDate, config: &OutletConfig) -> DailySalesReport {
    let day: Vec<Bill> = bills
        .iter()
        .filter(|bill| bill.created_at().date_naive() == date)
        .cloned()
        .collect();

    let total_sales: Money = day.iter().map(Bill::total).sum();
    let total_discount: Money = day.iter().map(Bill::discount).sum();
    let average_sale = match day.len() as i64 {
        0 => Money::zero(),
        n => Money::from_cents(total_sales.cents() / n),
    };

    DailySalesReport {
        date,
        transaction_count: day.len(),
        bills: day,
        total_sales,
        total_discount,
        average_sale,
        currency_symbol: config.currency_symbol.clone(),
    }
}

impl fmt::Display for DailySalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "      DAILY SALES REPORT       ")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Date: {}\n", self.date)?;

        if self.bills.is_empty() {
            return writeln!(f, "No sales found for this date.");
        }

        writeln!(f, "{:<15} {:<12} {:<10} {:<10}", "Invoice", "Total", "Discount", "Type")?;
        writeln!(f, "{THIN_RULE}")?;
        for bill in &self.bills {
            writeln!(
                f,
                "{:<15} {:<12} {:<10} {:<10}",
                bill.invoice_number(),
                bill.total().to_string(),
                bill.discount().to_string(),
                bill.channel().as_str()
            )?;
        }
        writeln!(f, "{THIN_RULE}")?;

        let sym = &self.currency_symbol;
        writeln!(f, "Total Transactions: {}", self.transaction_count)?;
        writeln!(f, "Total Sales: {}", self.total_sales.format_with(sym))?;
        writeln!(f, "Total Discounts: {}", self.total_discount.format_with(sym))?;
        writeln!(f, "Average Sale: {}", self.average_sale.format_with(sym))?;
        writeln!(f, "{RULE}")
    }
}

// =============================================================================
// Bill Transactions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillTransactionReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Newest first.
    pub bills: Vec<Bill>,
    pub transaction_count: usize,
    pub total_amount: Money,
    /// Zero when the period has no bills.
    pub average: Money,
    currency_symbol: String,
}

/// Bills created between `from` and `to` inclusive (UTC dates). A reversed
/// range matches nothing.
pub fn bill_transactions(
    bills: &[Bill],
    from: NaiveDate,
    to: NaiveDate,
    config: &OutletConfig,
) -> BillTransactionReport {
    let mut period: Vec<Bill> = bills
        .iter()
        .filter(|bill| {
            let day = bill.created_at().date_naive();
            from <= day && day <= to
        })
        .cloned()
        .collect();
    period.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

    let total_amount: Money = period.iter().map(Bill::total).sum();
    let average = match period.len() as i64 {
        0 => Money::zero(),
        n => Money::from_cents(total_amount.cents() / n),
    };

    BillTransactionReport {
        from,
        to,
        transaction_count: period.len(),
        bills: period,
        total_amount,
        average,
        currency_symbol: config.currency_symbol.clone(),
    }
}

impl fmt::Display for BillTransactionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "   BILL TRANSACTION REPORT     ")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Period: {} to {}\n", self.from, self.to)?;

        if self.bills.is_empty() {
            return writeln!(f, "No transactions found for this period.");
        }

        writeln!(
            f,
            "{:<15} {:<12} {:<12} {:<10} {:<10}",
            "Invoice", "Date", "Total", "Type", "Store"
        )?;
        writeln!(f, "{THIN_RULE}")?;
        for bill in &self.bills {
            writeln!(
                f,
                "{:<15} {:<12} {:<12} {:<10} {:<10}",
                bill.invoice_number(),
                bill.created_at().date_naive().to_string(),
                bill.total().to_string(),
                bill.channel().as_str(),
                bill.store_type().as_str()
            )?;
        }
        writeln!(f, "{THIN_RULE}")?;

        let sym = &self.currency_symbol;
        writeln!(f, "Total Transactions: {}", self.transaction_count)?;
        writeln!(f, "Total Amount: {}", self.total_amount.format_with(sym))?;
        writeln!(f, "Average Transaction: {}", self.average.format_with(sym))?;
        writeln!(f, "{RULE}")
    }
}

// =============================================================================
// Reorder
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderReport {
    pub pool: PoolKind,
    pub threshold: i64,
    pub items: Vec<LowStockItem>,
    pub total_suggested: i64,
}

pub fn reorder_report(ledger: &InventoryLedger, threshold: i64) -> ReorderReport {
    let items = ledger.low_stock_items(threshold);
    ReorderReport {
        pool: ledger.pool(),
        threshold,
        total_suggested: items.iter().map(|item| item.suggested_reorder).sum(),
        items,
    }
}

impl fmt::Display for ReorderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "       REORDER REPORT ({})", self.pool)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Reorder Threshold: {}\n", self.threshold)?;

        if self.items.is_empty() {
            writeln!(f, "No items need reordering at this time.")?;
            return writeln!(f, "{RULE}");
        }

        writeln!(f, "ITEMS REQUIRING REORDER:")?;
        writeln!(f, "{:<10} {:<25} {:<10} {:<15}", "Code", "Name", "Quantity", "Suggested Order")?;
        writeln!(f, "{THIN_RULE}")?;
        for item in &self.items {
            writeln!(
                f,
                "{:<10} {:<25} {:<10} {:<15}",
                item.item_code,
                truncate(&item.item_name, 25),
                item.available,
                item.suggested_reorder
            )?;
        }
        writeln!(f, "{THIN_RULE}")?;
        writeln!(f, "Total Items to Reorder: {}", self.items.len())?;
        writeln!(f, "Total Suggested Order Quantity: {}", self.total_suggested)?;
        writeln!(f, "{RULE}")
    }
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReport {
    pub pool: PoolKind,
    pub as_of: NaiveDate,
    pub batches: Vec<StockBatch>,
    pub low_stock: Vec<LowStockItem>,
}

pub fn stock_report(ledger: &InventoryLedger, threshold: i64) -> StockReport {
    StockReport {
        pool: ledger.pool(),
        as_of: ledger.today(),
        batches: ledger.snapshot(),
        low_stock: ledger.low_stock_items(threshold),
    }
}

impl fmt::Display for StockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "        STOCK REPORT ({})", self.pool)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "As of: {}\n", self.as_of)?;
        writeln!(
            f,
            "{:<10} {:<25} {:>8} {:>8} {:<12} {:<12}",
            "Code", "Name", "Qty", "Of", "Purchased", "Expires"
        )?;
        writeln!(f, "{THIN_RULE}")?;
        for batch in &self.batches {
            let flag = if !batch.is_available() {
                "  (exhausted)"
            } else if batch.expiry_date < self.as_of {
                "  (expired)"
            } else {
                ""
            };
            writeln!(
                f,
                "{:<10} {:<25} {:>8} {:>8} {:<12} {:<12}{}",
                batch.item_code,
                truncate(&batch.item_name, 25),
                batch.current_quantity,
                batch.original_quantity,
                batch.purchase_date.to_string(),
                batch.expiry_date.to_string(),
                flag
            )?;
        }
        writeln!(f, "{THIN_RULE}")?;
        writeln!(f, "Low stock items: {}", self.low_stock.len())?;
        for item in &self.low_stock {
            writeln!(f, "  {} {} ({} left)", item.item_code, item.item_name, item.available)?;
        }
        writeln!(f, "{RULE}")
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Receipt text for a bill.
pub fn render_bill(bill: &Bill, config: &OutletConfig) -> String {
    let money = |m: Money| config.format_money(m);
    let mut out = String::new();

    out.push_str(&format!("{RULE}\n"));
    out.push_str(&format!("{}\n", config.store_name));
    out.push_str(&format!("{RULE}\n"));
    out.push_str(&format!("Invoice: {}\n", bill.invoice_number()));
    out.push_str(&format!(
        "Date: {}\n",
        bill.created_at().format("%Y-%m-%d %H:%M")
    ));
    out.push_str(&format!("Store: {}\n", bill.store_type()));
    out.push_str(&format!("{THIN_RULE}\n"));

    for line in bill.lines() {
        out.push_str(&format!(
            "{:<25} {:>4} x {:>10} {:>12}\n",
            truncate(&line.item_name, 25),
            line.quantity,
            money(line.unit_price),
            money(line.line_total)
        ));
    }

    out.push_str(&format!("{THIN_RULE}\n"));
    out.push_str(&format!("Subtotal: {}\n", money(bill.subtotal())));
    if !bill.discount().is_zero() {
        out.push_str(&format!("Discount: {}\n", money(bill.discount())));
    }
    out.push_str(&format!("Total: {}\n", money(bill.total())));

    match bill.channel() {
        Channel::Counter => {
            out.push_str(&format!("Cash: {}\n", money(bill.cash_tendered())));
            out.push_str(&format!("Change: {}\n", money(bill.change())));
        }
        Channel::Online => {
            out.push_str(&format!("Shipping: {}\n", money(bill.shipping_fee())));
            out.push_str(&format!("Amount Due: {}\n", money(bill.grand_total())));
            out.push_str("Payment: Cash on delivery\n");
        }
    }
    out.push_str(&format!("{RULE}\n"));
    out
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
