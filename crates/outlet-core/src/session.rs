//! # Checkout Session
//!
//! A cart driven by an explicit state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   SelectingItems ──── pay ────► PaymentPending ── generate_bill ──►     │
//! │   ▲            │                                    BillGenerated      │
//! │   └────────────┘                                    (terminal)         │
//! │   add_line / remove_line / apply_discount                              │
//! │                                                                         │
//! │   Anything else ──► SaleError::InvalidStateTransition, nothing changes │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation first asks [`transition`] whether it is allowed from the
//! current state. The table is the single source of truth; the methods
//! below never compare states directly.
//!
//! ## Ownership
//! A session belongs to one caller (one terminal, one web checkout) and has
//! no internal locking. Totals are recomputed on demand.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::bill::{BillAssembler, BillDraft};
use crate::collaborators::ItemCatalog;
use crate::error::{SaleError, SaleResult};
use crate::money::Money;
use crate::policy;
use crate::types::{Bill, Channel, LineItem, StoreType};
use crate::validation::{
    merged_quantity, validate_item_code, validate_price, validate_quantity,
};

// =============================================================================
// States and Transition Table
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckoutState {
    SelectingItems,
    PaymentPending,
    BillGenerated,
}

impl CheckoutState {
    pub const ALL: [CheckoutState; 3] = [
        CheckoutState::SelectingItems,
        CheckoutState::PaymentPending,
        CheckoutState::BillGenerated,
    ];

    pub fn is_terminal(&self) -> bool {
        CheckoutOp::ALL
            .iter()
            .all(|op| transition(*self, *op).is_none())
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::SelectingItems => "SelectingItems",
            CheckoutState::PaymentPending => "PaymentPending",
            CheckoutState::BillGenerated => "BillGenerated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutOp {
    AddLine,
    RemoveLine,
    ApplyDiscount,
    Pay,
    GenerateBill,
}

impl CheckoutOp {
    pub const ALL: [CheckoutOp; 5] = [
        CheckoutOp::AddLine,
        CheckoutOp::RemoveLine,
        CheckoutOp::ApplyDiscount,
        CheckoutOp::Pay,
        CheckoutOp::GenerateBill,
    ];
}

impl fmt::Display for CheckoutOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            CheckoutOp::AddLine => "add a line",
            CheckoutOp::RemoveLine => "remove a line",
            CheckoutOp::ApplyDiscount => "apply a discount",
            CheckoutOp::Pay => "take payment",
            CheckoutOp::GenerateBill => "generate a bill",
        };
        f.write_str(verb)
    }
}

/// `(state, op) → next state`, or `None` if the op is not allowed.
pub const fn transition(state: CheckoutState, op: CheckoutOp) -> Option<CheckoutState> {
    use CheckoutOp::*;
    use CheckoutState::*;

    match (state, op) {
        (SelectingItems, AddLine | RemoveLine | ApplyDiscount) => Some(SelectingItems),
        (SelectingItems, Pay) => Some(PaymentPending),
        (PaymentPending, GenerateBill) => Some(BillGenerated),
        _ => None,
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    id: Uuid,
    channel: Channel,
    lines: Vec<LineItem>,
    discount: Money,
    cash_tendered: Money,
    change: Money,
    state: CheckoutState,
    bill: Option<Bill>,
    created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(channel: Channel) -> Self {
        CheckoutSession {
            id: Uuid::new_v4(),
            channel,
            lines: Vec::new(),
            discount: Money::zero(),
            cash_tendered: Money::zero(),
            change: Money::zero(),
            state: CheckoutState::SelectingItems,
            bill: None,
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn store_type(&self) -> StoreType {
        policy::store_type_for(self.channel)
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Lines in the order their codes were first added.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, code: &str) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.item_code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn cash_tendered(&self) -> Money {
        self.cash_tendered
    }

    pub fn change(&self) -> Money {
        self.change
    }

    pub fn bill(&self) -> Option<&Bill> {
        self.bill.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|line| line.line_total).sum()
    }

    /// Σ line totals − discount.
    pub fn calculate_total(&self) -> Money {
        self.subtotal() - self.discount
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    fn next_state(&self, op: CheckoutOp) -> SaleResult<CheckoutState> {
        transition(self.state, op).ok_or_else(|| SaleError::invalid_transition(self.state, op))
    }

    /// Adds `qty` of `code`, merging into an existing line for the same code.
    ///
    /// The merged line keeps the price captured when the code was first added.
    pub fn add_line(
        &mut self,
        catalog: &dyn ItemCatalog,
        code: &str,
        qty: i64,
    ) -> SaleResult<()> {
        let next = self.next_state(CheckoutOp::AddLine)?;
        validate_item_code(code)?;
        validate_quantity(qty)?;

        if let Some(line) = self.lines.iter_mut().find(|line| line.item_code == code) {
            merged_quantity(line.quantity, qty)?;
            line.increase(qty);
            debug!(session = %self.id, code, quantity = line.quantity, "Merged cart line");
        } else {
            let item = catalog.lookup(code)?;
            validate_price(item.price)?;
            debug!(session = %self.id, code, qty, price = %item.price, "Added cart line");
            self.lines.push(LineItem::from_item(&item, qty));
        }

        self.state = next;
        Ok(())
    }

    /// Removes the whole line for `code`. Returns the removed line, or
    /// `None` if the code was not in the cart.
    pub fn remove_line(&mut self, code: &str) -> SaleResult<Option<LineItem>> {
        let next = self.next_state(CheckoutOp::RemoveLine)?;

        let removed = self
            .lines
            .iter()
            .position(|line| line.item_code == code)
            .map(|idx| self.lines.remove(idx));

        if removed.is_some() {
            debug!(session = %self.id, code, "Removed cart line");
        }
        self.state = next;
        Ok(removed)
    }

    /// Replaces the discount. Not clamped to the subtotal.
    pub fn apply_discount(&mut self, amount: Money) -> SaleResult<()> {
        let next = self.next_state(CheckoutOp::ApplyDiscount)?;
        debug!(session = %self.id, discount = %amount, "Applied discount");
        self.discount = amount;
        self.state = next;
        Ok(())
    }

    /// Accepts payment and moves to `PaymentPending`.
    ///
    /// ## Rules
    /// - The cart must not be empty
    /// - COUNTER: `cash > 0` and `cash >= total`; change is `cash - total`
    /// - ONLINE: `cash == 0` (cash on delivery); change is zero
    pub fn pay(&mut self, cash: Money) -> SaleResult<()> {
        let next = self.next_state(CheckoutOp::Pay)?;

        if self.lines.is_empty() {
            return Err(SaleError::EmptyCart);
        }

        if !policy::is_cash_valid(self.channel, cash) {
            let reason = match self.channel {
                Channel::Counter => "cash tendered must be greater than zero",
                Channel::Online => "online orders are cash on delivery; cash tendered must be zero",
            };
            return Err(SaleError::invalid_payment(self.channel, reason));
        }

        let total = self.calculate_total();
        let change = match self.channel {
            Channel::Counter if cash < total => {
                return Err(SaleError::invalid_payment(
                    self.channel,
                    format!("cash tendered {} is less than total {}", cash, total),
                ));
            }
            Channel::Counter => cash - total,
            Channel::Online => Money::zero(),
        };

        self.cash_tendered = cash;
        self.change = change;
        self.state = next;
        info!(
            session = %self.id,
            channel = %self.channel,
            total = %total,
            cash = %cash,
            change = %change,
            "Payment accepted"
        );
        Ok(())
    }

    /// Builds the bill and moves to `BillGenerated`. Succeeds at most once.
    pub fn generate_bill(&mut self, assembler: &BillAssembler<'_>) -> SaleResult<&Bill> {
        let next = self.next_state(CheckoutOp::GenerateBill)?;

        let bill = assembler.assemble(BillDraft {
            channel: self.channel,
            lines: &self.lines,
            discount: self.discount,
            cash_tendered: self.cash_tendered,
            change: self.change,
        })?;

        info!(session = %self.id, invoice = %bill.invoice_number(), "Bill generated");
        self.state = next;
        Ok(self.bill.insert(bill))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
