//! Wire models for the HTTP API
//!
//! Requests reject unknown fields outright; responses render prices as
//! two-decimal strings and timestamps as ISO-8601 UTC.

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use persistence::{OrderFilter, PageResult};
use types::ids::{OrderId, OwnerId, TradeId};
use types::time::format_rfc3339;
use types::{EngineError, Order, OrderStatus, Price, Side, Trade};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceOrderRequest {
    pub side: Side,
    pub quantity: u64,
    pub price: Price,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModifyOrderRequest {
    pub price: Price,
}

/// Full order record as returned by every order endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub side: Side,
    pub quantity: u64,
    pub price: Price,
    pub remaining_quantity: u64,
    pub traded_quantity: u64,
    pub average_traded_price: String,
    pub status: OrderStatus,
    pub is_active: bool,
    pub owner_id: Option<OwnerId>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let average = order
            .average_traded_price()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            order_id: order.order_id,
            side: order.side,
            quantity: order.quantity,
            price: order.price,
            remaining_quantity: order.remaining_quantity,
            traded_quantity: order.traded_quantity,
            average_traded_price: format!("{average:.2}"),
            status: order.status,
            is_active: order.is_active,
            owner_id: order.owner_id,
            created_at: format_rfc3339(order.created_at),
            updated_at: format_rfc3339(order.updated_at),
        }
    }
}

/// Full trade record as returned by the query endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResponse {
    pub trade_id: TradeId,
    pub price: Price,
    pub quantity: u64,
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
    pub execution_timestamp: String,
    pub is_settled: bool,
    pub settlement_timestamp: Option<String>,
}

impl From<&Trade> for TradeResponse {
    fn from(trade: &Trade) -> Self {
        Self {
            trade_id: trade.trade_id,
            price: trade.price,
            quantity: trade.quantity,
            bid_order_id: trade.bid_order_id,
            ask_order_id: trade.ask_order_id,
            execution_timestamp: format_rfc3339(trade.executed_at),
            is_settled: trade.is_settled,
            settlement_timestamp: trade.settled_at.map(format_rfc3339),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    pub fn from_result<T>(result: &PageResult<T>) -> Self {
        Self {
            page: result.page,
            page_size: result.page_size,
            total_pages: result.total_pages(),
            total_count: result.total_count,
            has_next: result.has_next(),
            has_previous: result.has_previous(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeListResponse {
    pub trades: Vec<TradeResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub side: Option<String>,
    pub owner_id: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListOrdersQuery {
    /// Translate the string filters into typed predicates.
    pub fn filter(&self) -> Result<OrderFilter, EngineError> {
        let status = match &self.status {
            Some(raw) => Some(OrderStatus::parse(raw).ok_or_else(|| {
                EngineError::Validation(format!("unknown status filter: {raw}"))
            })?),
            None => None,
        };
        let side = match &self.side {
            Some(raw) => Some(Side::parse(raw).ok_or_else(|| {
                EngineError::Validation(format!("side must be 'buy' or 'sell', got: {raw}"))
            })?),
            None => None,
        };
        Ok(OrderFilter {
            status,
            side,
            owner_id: self.owner_id.map(OwnerId::from_uuid),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTradesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepthQuery {
    pub depth: Option<usize>,
}
