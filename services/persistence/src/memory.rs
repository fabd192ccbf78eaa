//! In-memory store
//!
//! Backs tests and database-less runs. Behavior mirrors the Postgres
//! backend: newest-first listings, one-shot settlement, creation-ordered
//! recovery reads.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{OrderFilter, Page, PageResult, Store};
use types::{EngineError, Order, OrderId, OrderStatus, Trade, TradeId};

/// Hash-map backed [`Store`] implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    trades: RwLock<Vec<Trade>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn paginate<T>(mut items: Vec<T>, page: Page) -> PageResult<T> {
        let total_count = items.len() as u64;
        let start = (page.offset() as usize).min(items.len());
        let end = (start + page.page_size as usize).min(items.len());
        let items = items.drain(start..end).collect();
        PageResult {
            items,
            page: page.page,
            page_size: page.page_size,
            total_count,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_order(&self, order: &Order) -> Result<(), EngineError> {
        self.orders
            .write()
            .await
            .insert(order.order_id, order.clone());
        Ok(())
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        self.trades.write().await.push(trade.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, EngineError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<PageResult<Order>, EngineError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        // Newest first; id breaks creation-time ties deterministically
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_id.cmp(&a.order_id))
        });
        Ok(Self::paginate(matching, page))
    }

    async fn get_trade(&self, trade_id: TradeId) -> Result<Option<Trade>, EngineError> {
        Ok(self
            .trades
            .read()
            .await
            .iter()
            .find(|t| t.trade_id == trade_id)
            .cloned())
    }

    async fn list_trades(&self, page: Page) -> Result<PageResult<Trade>, EngineError> {
        let trades = self.trades.read().await;
        let mut all: Vec<Trade> = trades.clone();
        all.sort_by(|a, b| {
            b.executed_at
                .cmp(&a.executed_at)
                .then(b.trade_id.cmp(&a.trade_id))
        });
        Ok(Self::paginate(all, page))
    }

    async fn settle_trade(&self, trade_id: TradeId, timestamp: i64) -> Result<Trade, EngineError> {
        let mut trades = self.trades.write().await;
        let trade = trades
            .iter_mut()
            .find(|t| t.trade_id == trade_id)
            .ok_or_else(|| EngineError::TradeNotFound(trade_id.to_string()))?;
        if trade.is_settled {
            return Err(EngineError::StateConflict(format!(
                "trade {trade_id} already settled"
            )));
        }
        trade.settle(timestamp);
        Ok(trade.clone())
    }

    async fn open_orders(&self) -> Result<Vec<Order>, EngineError> {
        let orders = self.orders.read().await;
        let mut open: Vec<Order> = orders
            .values()
            .filter(|o| {
                matches!(
                    o.status,
                    OrderStatus::Active | OrderStatus::PartiallyFilled
                )
            })
            .cloned()
            .collect();
        open.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.order_id.cmp(&b.order_id))
        });
        Ok(open)
    }
}
