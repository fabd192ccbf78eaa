//! End-to-end tests for the book lane over the in-memory store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use matching_engine::{spawn, BookHandle, PlaceOrder};
use persistence::{MemoryStore, OrderFilter, Page, Store};
use types::{EngineError, Order, OrderId, OrderStatus, Price, Side, Trade, TradeId};

fn place_request(side: Side, quantity: u64, cents: i64) -> PlaceOrder {
    PlaceOrder {
        side,
        quantity,
        price: Price::from_cents(cents),
        owner_id: None,
    }
}

async fn start_lane() -> (BookHandle, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let handle = spawn(store.clone()).await.unwrap();
    (handle, store)
}

#[tokio::test]
async fn resting_book_no_cross() {
    let (lane, _store) = start_lane().await;

    let sell = lane.place(place_request(Side::SELL, 10, 10_100)).await.unwrap();
    let buy = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();

    assert_eq!(sell.status, OrderStatus::Active);
    assert_eq!(buy.status, OrderStatus::Active);

    let depth = lane.depth(5).await.unwrap();
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].price, Price::from_cents(10_000));
    assert_eq!(depth.bids[0].quantity, 10);
    assert_eq!(depth.asks[0].price, Price::from_cents(10_100));
    assert_eq!(depth.asks[0].quantity, 10);

    let (_, trades) = lane.trades_since(0).await.unwrap();
    assert!(trades.is_empty());
}

#[tokio::test]
async fn crossing_buy_fills_at_passive_price_and_persists() {
    let (lane, store) = start_lane().await;

    let sell = lane.place(place_request(Side::SELL, 10, 10_100)).await.unwrap();
    let buy = lane.place(place_request(Side::BUY, 4, 10_200)).await.unwrap();

    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(buy.traded_quantity, 4);
    assert!(!buy.is_active);

    let (cursor, trades) = lane.trades_since(0).await.unwrap();
    assert_eq!(cursor, 1);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, Price::from_cents(10_100));
    assert_eq!(trades[0].quantity, 4);
    assert_eq!(trades[0].bid_order_id, buy.order_id);
    assert_eq!(trades[0].ask_order_id, sell.order_id);

    // Write-through: maker transition and trade are durable
    let maker = store.get_order(sell.order_id).await.unwrap().unwrap();
    assert_eq!(maker.status, OrderStatus::PartiallyFilled);
    assert_eq!(maker.remaining_quantity, 6);
    let stored = store.get_trade(trades[0].trade_id).await.unwrap().unwrap();
    assert_eq!(stored.quantity, 4);

    // Maker remainder still quoted at the head of its level
    let depth = lane.depth(5).await.unwrap();
    assert_eq!(depth.asks[0].quantity, 6);
}

#[tokio::test]
async fn place_then_cancel_round_trip() {
    let (lane, store) = start_lane().await;

    let order = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();
    let cancelled = lane.cancel(order.order_id).await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.traded_quantity, 0);
    assert_eq!(cancelled.remaining_quantity, 10);

    // Cancel is not silently idempotent
    let again = lane.cancel(order.order_id).await;
    assert!(matches!(again, Err(EngineError::StateConflict(_))));

    let stored = store.get_order(order.order_id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn cancel_after_partial_fill_freezes_quantities() {
    let (lane, _store) = start_lane().await;

    lane.place(place_request(Side::SELL, 3, 10_000)).await.unwrap();
    let buy = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();
    assert_eq!(buy.status, OrderStatus::PartiallyFilled);

    let cancelled = lane.cancel(buy.order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.traded_quantity, 3);
    assert_eq!(cancelled.remaining_quantity, 7);

    let depth = lane.depth(5).await.unwrap();
    assert!(depth.bids.is_empty());
}

#[tokio::test]
async fn cancel_unknown_order_is_not_found() {
    let (lane, _store) = start_lane().await;
    let missing = lane.cancel(OrderId::new()).await;
    assert!(matches!(missing, Err(EngineError::OrderNotFound(_))));
}

#[tokio::test]
async fn modify_forfeits_priority_and_can_cross() {
    let (lane, _store) = start_lane().await;

    let _first = lane.place(place_request(Side::SELL, 10, 10_000)).await.unwrap();
    let second = lane.place(place_request(Side::SELL, 10, 10_000)).await.unwrap();

    // Reprice the later order below the earlier one
    let moved = lane
        .modify(second.order_id, Price::from_cents(9_900))
        .await
        .unwrap();
    assert_eq!(moved.status, OrderStatus::Active);
    assert_eq!(moved.price, Price::from_cents(9_900));

    // A buy at 99.00 now trades with the repriced order, not the earlier one
    let buy = lane.place(place_request(Side::BUY, 5, 9_900)).await.unwrap();
    assert_eq!(buy.status, OrderStatus::Filled);

    let (_, trades) = lane.trades_since(0).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].ask_order_id, second.order_id);
    assert_eq!(trades[0].price, Price::from_cents(9_900));

    // The untouched order keeps its level
    let depth = lane.depth(5).await.unwrap();
    assert_eq!(depth.asks[0].price, Price::from_cents(9_900));
    assert_eq!(depth.asks[0].quantity, 5);
    assert_eq!(depth.asks[1].price, Price::from_cents(10_000));
    assert_eq!(depth.asks[1].quantity, 10);
}

#[tokio::test]
async fn modify_preserves_fills_and_vwap() {
    let (lane, _store) = start_lane().await;

    lane.place(place_request(Side::SELL, 4, 10_000)).await.unwrap();
    let buy = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();
    assert_eq!(buy.traded_quantity, 4);

    let moved = lane
        .modify(buy.order_id, Price::from_cents(10_100))
        .await
        .unwrap();

    assert_eq!(moved.order_id, buy.order_id);
    assert_eq!(moved.status, OrderStatus::PartiallyFilled);
    assert_eq!(moved.traded_quantity, 4);
    assert_eq!(moved.remaining_quantity, 6);
    assert_eq!(moved.price, Price::from_cents(10_100));
    assert_eq!(
        moved.average_traded_price(),
        "100.00".parse::<rust_decimal::Decimal>().unwrap()
    );
}

#[tokio::test]
async fn modify_crossing_executes_immediately() {
    let (lane, _store) = start_lane().await;

    lane.place(place_request(Side::SELL, 5, 10_200)).await.unwrap();
    let bid = lane.place(place_request(Side::BUY, 5, 10_000)).await.unwrap();

    let moved = lane
        .modify(bid.order_id, Price::from_cents(10_200))
        .await
        .unwrap();

    assert_eq!(moved.status, OrderStatus::Filled);
    let (_, trades) = lane.trades_since(0).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, Price::from_cents(10_200));
}

#[tokio::test]
async fn modify_inactive_order_conflicts() {
    let (lane, _store) = start_lane().await;

    let order = lane.place(place_request(Side::BUY, 5, 10_000)).await.unwrap();
    lane.cancel(order.order_id).await.unwrap();

    let result = lane.modify(order.order_id, Price::from_cents(10_100)).await;
    assert!(matches!(result, Err(EngineError::StateConflict(_))));

    let unknown = lane.modify(OrderId::new(), Price::from_cents(10_100)).await;
    assert!(matches!(unknown, Err(EngineError::OrderNotFound(_))));
}

#[tokio::test]
async fn validation_rejects_and_records() {
    let (lane, store) = start_lane().await;

    let result = lane.place(place_request(Side::BUY, 0, 10_000)).await;
    assert!(matches!(result, Err(EngineError::Validation(_))));

    // The rejection is recorded as a terminal REJECTED row
    let rejected = store
        .list_orders(
            &OrderFilter {
                status: Some(OrderStatus::Rejected),
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.total_count, 1);
    assert_eq!(rejected.items[0].quantity, 0);
}

#[tokio::test]
async fn trade_cursor_advances_without_replay() {
    let (lane, _store) = start_lane().await;

    lane.place(place_request(Side::SELL, 5, 10_000)).await.unwrap();
    lane.place(place_request(Side::BUY, 5, 10_000)).await.unwrap();

    let (cursor, first_batch) = lane.trades_since(0).await.unwrap();
    assert_eq!(first_batch.len(), 1);

    let (cursor2, empty) = lane.trades_since(cursor).await.unwrap();
    assert_eq!(cursor2, cursor);
    assert!(empty.is_empty());

    lane.place(place_request(Side::SELL, 2, 10_000)).await.unwrap();
    lane.place(place_request(Side::BUY, 2, 10_000)).await.unwrap();

    let (_, second_batch) = lane.trades_since(cursor).await.unwrap();
    assert_eq!(second_batch.len(), 1);
    assert_eq!(second_batch[0].quantity, 2);
}

#[tokio::test]
async fn restart_rebuilds_book_with_time_priority() {
    let store = Arc::new(MemoryStore::new());

    // First run: two resting sells at the same price, then the lane goes away
    {
        let lane = spawn(store.clone()).await.unwrap();
        lane.place(place_request(Side::SELL, 10, 10_000)).await.unwrap();
        lane.place(place_request(Side::SELL, 10, 10_000)).await.unwrap();
    }

    // Second run rebuilds from persisted open orders
    let lane = spawn(store.clone()).await.unwrap();
    let depth = lane.depth(5).await.unwrap();
    assert_eq!(depth.asks[0].quantity, 20);

    // Earlier-created order still fills first
    let open = store.open_orders().await.unwrap();
    let buy = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();
    assert_eq!(buy.status, OrderStatus::Filled);
    let (_, trades) = lane.trades_since(0).await.unwrap();
    assert_eq!(trades[0].ask_order_id, open[0].order_id);
}

/// Store wrapper that can be switched into a failing mode.
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(EngineError::Storage("injected outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn upsert_order(&self, order: &Order) -> Result<(), EngineError> {
        self.check()?;
        self.inner.upsert_order(order).await
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        self.check()?;
        self.inner.insert_trade(trade).await
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, EngineError> {
        self.inner.get_order(order_id).await
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<persistence::PageResult<Order>, EngineError> {
        self.inner.list_orders(filter, page).await
    }

    async fn get_trade(&self, trade_id: TradeId) -> Result<Option<Trade>, EngineError> {
        self.inner.get_trade(trade_id).await
    }

    async fn list_trades(&self, page: Page) -> Result<persistence::PageResult<Trade>, EngineError> {
        self.inner.list_trades(page).await
    }

    async fn settle_trade(&self, trade_id: TradeId, timestamp: i64) -> Result<Trade, EngineError> {
        self.inner.settle_trade(trade_id, timestamp).await
    }

    async fn open_orders(&self) -> Result<Vec<Order>, EngineError> {
        self.inner.open_orders().await
    }
}

#[tokio::test]
async fn storage_outage_absorbed_for_resting_surfaced_for_terminal() {
    let store = Arc::new(FlakyStore::new());
    let lane = spawn(store.clone()).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);

    // Resting order: the dropped write is absorbed, the book stays authoritative
    let resting = lane.place(place_request(Side::BUY, 10, 10_000)).await.unwrap();
    assert_eq!(resting.status, OrderStatus::Active);
    let depth = lane.depth(5).await.unwrap();
    assert_eq!(depth.bids[0].quantity, 10);

    // Terminal transition: the failure surfaces to the caller
    let cancel = lane.cancel(resting.order_id).await;
    assert!(matches!(cancel, Err(EngineError::Storage(_))));

    store.failing.store(false, Ordering::SeqCst);
}
