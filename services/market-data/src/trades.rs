//! Public trade stream messages
//!
//! Wire form of an execution for the trade feed. Carries only public
//! fields; settlement state stays on the query API.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, TradeId};
use types::time::format_rfc3339;
use types::{Price, Trade};

/// One execution as broadcast to trade feed subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMessage {
    pub trade_id: TradeId,
    pub price: Price,
    pub quantity: u64,
    /// ISO-8601 UTC
    pub execution_timestamp: String,
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
}

impl From<&Trade> for TradeMessage {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.trade_id,
            price: trade.price,
            quantity: trade.quantity,
            execution_timestamp: format_rfc3339(trade.executed_at),
            bid_order_id: trade.bid_order_id,
            ask_order_id: trade.ask_order_id,
        }
    }
}

/// Periodic trade feed payload: every execution since the previous emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFeedMessage {
    pub trades: Vec<TradeMessage>,
}

impl TradeFeedMessage {
    pub fn new(trades: &[Trade]) -> Self {
        Self {
            trades: trades.iter().map(TradeMessage::from).collect(),
        }
    }
}
