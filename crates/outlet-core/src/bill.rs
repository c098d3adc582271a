//! # Bill Assembly
//!
//! Turns a paid checkout into an immutable [`Bill`] with a fresh invoice
//! number.
//!
//! ```text
//! CheckoutSession (PaymentPending)
//!        │  BillDraft { channel, lines, discount, cash, change }
//!        ▼
//! BillAssembler ──► InvoiceSequence::next()  ──► "42"
//!        │      ──► ShippingRule::fee_for()   ──► 5.99 | 0
//!        ▼
//! Bill { invoice_number, store_type (derived), totals, created_at }
//! ```

use chrono::Utc;
use tracing::debug;

use crate::collaborators::InvoiceSequence;
use crate::error::SaleResult;
use crate::money::Money;
use crate::policy::ShippingRule;
use crate::types::{Bill, BillParts, Channel, LineItem};

/// Borrowed view of everything a bill is built from.
#[derive(Debug, Clone, Copy)]
pub struct BillDraft<'a> {
    pub channel: Channel,
    pub lines: &'a [LineItem],
    pub discount: Money,
    pub cash_tendered: Money,
    pub change: Money,
}

impl BillDraft<'_> {
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|line| line.line_total).sum()
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount
    }
}

/// Builds bills. Holds the invoice sequence and the shipping rule.
pub struct BillAssembler<'a> {
    sequence: &'a dyn InvoiceSequence,
    shipping: ShippingRule,
}

impl<'a> BillAssembler<'a> {
    pub fn new(sequence: &'a dyn InvoiceSequence, shipping: ShippingRule) -> Self {
        BillAssembler { sequence, shipping }
    }

    /// Draws an invoice number and snapshots the draft. Nothing is drawn
    /// from the sequence if this is never called.
    pub fn assemble(&self, draft: BillDraft<'_>) -> SaleResult<Bill> {
        let invoice_number = self.sequence.next()?;
        let subtotal = draft.subtotal();
        let total = subtotal - draft.discount;

        debug!(
            invoice = %invoice_number,
            channel = %draft.channel,
            total = %total,
            "Assembling bill"
        );

        Ok(Bill::from_parts(BillParts {
            invoice_number,
            channel: draft.channel,
            lines: draft.lines.to_vec(),
            subtotal,
            discount: draft.discount,
            total,
            shipping_fee: self.shipping.fee_for(draft.channel, total),
            cash_tendered: draft.cash_tendered,
            change: draft.change,
            created_at: Utc::now(),
        }))
    }
}
