//! Storage contract shared by all backends
//!
//! An order row is upserted on every status transition; a trade row is
//! inserted once and touched again only by settlement. Reads serve the
//! query endpoints, so filters and pagination live here too.

use async_trait::async_trait;
use types::{EngineError, Order, OrderId, Trade, TradeId};

/// Optional predicates for order listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<types::OrderStatus>,
    pub side: Option<types::Side>,
    pub owner_id: Option<types::OwnerId>,
}

impl OrderFilter {
    /// Whether an order satisfies every present predicate.
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.side.map_or(true, |s| order.side == s)
            && self.owner_id.map_or(true, |o| order.owner_id == Some(o))
    }
}

/// One-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    /// Build a page request, substituting defaults for missing or
    /// out-of-range values.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = page_size
            .filter(|s| (1..=Self::MAX_SIZE).contains(s))
            .unwrap_or(Self::DEFAULT_SIZE);
        Self { page, page_size }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A page of results plus enough bookkeeping to render pagination links.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> PageResult<T> {
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.page_size);
        (self.total_count.max(1) + size - 1) / size
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Durable storage for orders and trades.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace an order row; called on every status transition.
    async fn upsert_order(&self, order: &Order) -> Result<(), EngineError>;

    /// Insert a trade row; trades are immutable apart from settlement.
    async fn insert_trade(&self, trade: &Trade) -> Result<(), EngineError>;

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, EngineError>;

    /// Orders matching the filter, newest first.
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<PageResult<Order>, EngineError>;

    async fn get_trade(&self, trade_id: TradeId) -> Result<Option<Trade>, EngineError>;

    /// All trades, most recent execution first.
    async fn list_trades(&self, page: Page) -> Result<PageResult<Trade>, EngineError>;

    /// One-shot settle transition; re-settling is a state conflict.
    async fn settle_trade(&self, trade_id: TradeId, timestamp: i64) -> Result<Trade, EngineError>;

    /// ACTIVE and PARTIALLY_FILLED orders in creation order, for rebuilding
    /// the book after a restart.
    async fn open_orders(&self) -> Result<Vec<Order>, EngineError>;
}
