//! Order lifecycle types
//!
//! An order moves along a one-way status graph:
//! PENDING → {REJECTED, ACTIVE} → PARTIALLY_FILLED → {FILLED, CANCELLED},
//! with CANCELLED also reachable straight from ACTIVE. Quantity bookkeeping
//! maintains `traded + remaining = total` at every observable state.

use crate::ids::{OrderId, OwnerId};
use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest accepted order quantity.
pub const MAX_QUANTITY: u64 = 1_000_000;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Wire/storage code: 1 for buy, -1 for sell
    pub fn as_code(&self) -> i16 {
        match self {
            Side::BUY => 1,
            Side::SELL => -1,
        }
    }

    /// Decode the storage code
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Side::BUY),
            -1 => Some(Side::SELL),
            _ => None,
        }
    }

    /// Parse the lowercase wire form ("buy" / "sell"), case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Some(Side::BUY),
            "sell" => Some(Side::SELL),
            _ => None,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created by intake, not yet validated (transient)
    Pending,
    /// Admitted to the book with no fills
    Active,
    /// Some quantity traded, remainder still working
    PartiallyFilled,
    /// Completely traded (terminal)
    Filled,
    /// Withdrawn by the owner (terminal)
    Cancelled,
    /// Failed validation (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Storage string, identical to the wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Active => "ACTIVE",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    /// Parse the storage/wire string, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "ACTIVE" => Some(OrderStatus::Active),
            "PARTIALLY_FILLED" => Some(OrderStatus::PartiallyFilled),
            "FILLED" => Some(OrderStatus::Filled),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "REJECTED" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

/// A limit order
///
/// The volume-weighted average execution price is kept as an integer
/// accumulator (`traded_value_cents` over `traded_quantity`) rather than a
/// rounded scalar, so repeated fills cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub side: Side,
    /// Total quantity to buy or sell
    pub quantity: u64,
    pub price: Price,
    /// Quantity still unfilled
    pub remaining_quantity: u64,
    /// Quantity already traded
    pub traded_quantity: u64,
    /// Σ fill_qty × fill_price, in cents — VWAP numerator
    pub traded_value_cents: u128,
    pub status: OrderStatus,
    /// True iff the order is resting in the book
    pub is_active: bool,
    pub owner_id: Option<OwnerId>,
    pub created_at: i64, // Unix nanos
    pub updated_at: i64, // Unix nanos
}

impl Order {
    /// Create a new pending order
    pub fn new(
        side: Side,
        quantity: u64,
        price: Price,
        owner_id: Option<OwnerId>,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            side,
            quantity,
            price,
            remaining_quantity: quantity,
            traded_quantity: 0,
            traded_value_cents: 0,
            status: OrderStatus::Pending,
            is_active: false,
            owner_id,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Check quantity invariant: traded + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.traded_quantity + self.remaining_quantity == self.quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        self.traded_quantity > 0
    }

    /// Volume-weighted average execution price; zero before any fill.
    pub fn average_traded_price(&self) -> Decimal {
        if self.traded_quantity == 0 {
            return Decimal::ZERO;
        }
        Decimal::from_i128_with_scale(self.traded_value_cents as i128, 2)
            / Decimal::from(self.traded_quantity)
    }

    /// Admit a validated order: PENDING → ACTIVE
    ///
    /// # Panics
    /// Panics if the order is not pending.
    pub fn activate(&mut self, timestamp: i64) {
        assert_eq!(self.status, OrderStatus::Pending, "only pending orders activate");
        self.status = OrderStatus::Active;
        self.updated_at = timestamp;
    }

    /// Fail validation: PENDING → REJECTED
    pub fn reject(&mut self, timestamp: i64) {
        assert_eq!(self.status, OrderStatus::Pending, "only pending orders reject");
        self.status = OrderStatus::Rejected;
        self.is_active = false;
        self.updated_at = timestamp;
    }

    /// Record an execution against this order
    ///
    /// Deducts from remaining, adds to traded, and feeds the VWAP
    /// accumulator. A fill that empties the order marks it FILLED and
    /// inactive.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn apply_fill(&mut self, fill_quantity: u64, fill_price: Price, timestamp: i64) {
        assert!(
            fill_quantity <= self.remaining_quantity,
            "fill would exceed remaining quantity"
        );

        self.remaining_quantity -= fill_quantity;
        self.traded_quantity += fill_quantity;
        self.traded_value_cents +=
            u128::from(fill_quantity) * fill_price.as_cents() as u128;

        if self.remaining_quantity == 0 {
            self.status = OrderStatus::Filled;
            self.is_active = false;
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }
        self.updated_at = timestamp;

        assert!(self.check_invariant(), "quantity invariant violated after fill");
    }

    /// Withdraw the order, freezing traded and remaining quantities.
    ///
    /// # Panics
    /// Panics if the order is already terminal.
    pub fn cancel(&mut self, timestamp: i64) {
        assert!(!self.status.is_terminal(), "cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
        self.is_active = false;
        self.updated_at = timestamp;
    }
}
