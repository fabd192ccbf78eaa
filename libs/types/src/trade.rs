//! Trade execution and settlement types
//!
//! A trade is immutable after creation except for the one-shot settle
//! transition.

use crate::ids::{OrderId, TradeId};
use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An execution between a resting order and an incoming order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    /// Execution price — always the resting side's limit price
    pub price: Price,
    pub quantity: u64,
    /// The buy order that participated
    pub bid_order_id: OrderId,
    /// The sell order that participated
    pub ask_order_id: OrderId,
    pub executed_at: i64, // Unix nanos
    pub is_settled: bool,
    pub settled_at: Option<i64>,
}

impl Trade {
    /// Create a new unsettled trade
    pub fn new(
        price: Price,
        quantity: u64,
        bid_order_id: OrderId,
        ask_order_id: OrderId,
        executed_at: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            price,
            quantity,
            bid_order_id,
            ask_order_id,
            executed_at,
            is_settled: false,
            settled_at: None,
        }
    }

    /// Mark the trade settled
    ///
    /// # Panics
    /// Panics if the trade was already settled; callers check first and
    /// report a state conflict.
    pub fn settle(&mut self, timestamp: i64) {
        assert!(!self.is_settled, "trade already settled");
        self.is_settled = true;
        self.settled_at = Some(timestamp);
    }

    /// Trade value (price × quantity)
    pub fn trade_value(&self) -> Decimal {
        self.price.as_decimal() * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        Trade::new(
            Price::from_cents(10_100),
            4,
            OrderId::new(),
            OrderId::new(),
            1_708_123_456_789_000_000,
        )
    }

    #[test]
    fn test_trade_creation() {
        let trade = sample_trade();
        assert!(!trade.is_settled);
        assert!(trade.settled_at.is_none());
        assert_eq!(trade.quantity, 4);
    }

    #[test]
    fn test_trade_settlement() {
        let mut trade = sample_trade();
        let settled_at = trade.executed_at + 1_000;

        trade.settle(settled_at);
        assert!(trade.is_settled);
        assert_eq!(trade.settled_at, Some(settled_at));
        assert!(trade.settled_at.unwrap() >= trade.executed_at);
    }

    #[test]
    #[should_panic(expected = "trade already settled")]
    fn test_double_settle_panics() {
        let mut trade = sample_trade();
        trade.settle(trade.executed_at + 1);
        trade.settle(trade.executed_at + 2);
    }

    #[test]
    fn test_trade_value() {
        let trade = sample_trade();
        // 4 × 101.00
        assert_eq!(trade.trade_value(), Decimal::new(40_400, 2));
    }

    #[test]
    fn test_trade_serialization_round_trip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
