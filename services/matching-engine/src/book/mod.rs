//! Order book infrastructure
//!
//! The book couples three structures that must stay in lockstep:
//! - per-side `BTreeMap`s of price levels ([`bid_book`], [`ask_book`]),
//! - a shared slab arena of resting order nodes ([`node`]),
//! - an id → slab-key index for O(1) lookup of any live order.
//!
//! The book is the exclusive live handle to resting orders: an order is
//! reachable through the index exactly while `is_active` is true.

pub mod ask_book;
pub mod bid_book;
pub mod node;
pub mod price_level;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slab::Slab;

use ask_book::AskBook;
use bid_book::BidBook;
use node::OrderNode;
use types::{Order, OrderId, Price, Side};

/// One aggregated price level in a depth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: u64,
}

/// Aggregated top-of-book view: bids descending, asks ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Single-instrument limit order book.
#[derive(Debug, Default)]
pub struct Book {
    nodes: Slab<OrderNode>,
    index: HashMap<OrderId, usize>,
    bids: BidBook,
    asks: AskBook,
}

impl Book {
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            index: HashMap::new(),
            bids: BidBook::new(),
            asks: AskBook::new(),
        }
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether an order is currently resting
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Read access to a resting order
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let key = self.index.get(order_id)?;
        Some(&self.nodes[*key].order)
    }

    /// Admit an order at the tail of its price level, creating the level
    /// if absent, and register it in the id index.
    ///
    /// # Panics
    /// Panics if the order has nothing left to trade or is already present.
    pub fn insert(&mut self, mut order: Order) {
        assert!(order.remaining_quantity > 0, "cannot rest an empty order");
        assert!(
            !self.index.contains_key(&order.order_id),
            "order already resting"
        );

        order.is_active = true;
        let side = order.side;
        let price = order.price;
        let order_id = order.order_id;

        let key = self.nodes.insert(OrderNode::new(order));
        let level = match side {
            Side::BUY => self.bids.get_or_create(price),
            Side::SELL => self.asks.get_or_create(price),
        };
        level.push_back(key, &mut self.nodes);
        self.index.insert(order_id, key);
    }

    /// Excise a resting order from its queue, its level (removing the level
    /// if it empties), and the index. Returns the order marked inactive.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let key = self.index.remove(order_id)?;
        let (side, price) = {
            let node = &self.nodes[key];
            (node.order.side, node.order.price)
        };

        let level_emptied = {
            let level = match side {
                Side::BUY => self.bids.level_mut(price),
                Side::SELL => self.asks.level_mut(price),
            }
            .expect("resting order has a level");
            level.remove(key, &mut self.nodes);
            level.is_empty()
        };
        if level_emptied {
            match side {
                Side::BUY => self.bids.remove_level(price),
                Side::SELL => self.asks.remove_level(price),
            }
        }

        let mut node = self.nodes.remove(key);
        node.order.is_active = false;
        Some(node.order)
    }

    /// Best bid as (price, aggregated quantity)
    pub fn best_bid(&self) -> Option<(Price, u64)> {
        self.bids
            .best_level()
            .map(|(price, level)| (price, level.total_quantity()))
    }

    /// Best ask as (price, aggregated quantity)
    pub fn best_ask(&self) -> Option<(Price, u64)> {
        self.asks
            .best_level()
            .map(|(price, level)| (price, level.total_quantity()))
    }

    /// Best price on the given side
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::BUY => self.bids.best_price(),
            Side::SELL => self.asks.best_price(),
        }
    }

    /// Head order of the best level on the given side:
    /// (order id, remaining quantity, resting price)
    pub(crate) fn head_of_best(&self, side: Side) -> Option<(OrderId, u64, Price)> {
        let (_, level) = match side {
            Side::BUY => self.bids.best_level(),
            Side::SELL => self.asks.best_level(),
        }?;
        let key = level.peek_head()?;
        let node = &self.nodes[key];
        Some((
            node.order.order_id,
            node.order.remaining_quantity,
            node.order.price,
        ))
    }

    /// Execute a fill against the head order of the best level on `side`.
    ///
    /// Applies the fill at the resting order's own price, maintains the
    /// level aggregate, and excises order and level when they empty.
    /// Returns the maker's post-fill state.
    ///
    /// # Panics
    /// Panics if the side is empty or the fill exceeds the head's remainder.
    pub(crate) fn fill_best_head(&mut self, side: Side, quantity: u64, timestamp: i64) -> Order {
        let (price, key) = {
            let (price, level) = match side {
                Side::BUY => self.bids.best_level(),
                Side::SELL => self.asks.best_level(),
            }
            .expect("fill against an empty side");
            (price, level.peek_head().expect("fill against an empty level"))
        };

        let node = self.nodes.get_mut(key).expect("head key is live");
        node.order.apply_fill(quantity, price, timestamp);
        let maker = node.order.clone();

        let level = match side {
            Side::BUY => self.bids.level_mut(price),
            Side::SELL => self.asks.level_mut(price),
        }
        .expect("best level exists");
        level.reduce_quantity(quantity);

        if maker.is_filled() {
            level.remove(key, &mut self.nodes);
            let emptied = level.is_empty();
            if emptied {
                match side {
                    Side::BUY => self.bids.remove_level(price),
                    Side::SELL => self.asks.remove_level(price),
                }
            }
            self.nodes.remove(key);
            self.index.remove(&maker.order_id);
        }

        maker
    }

    /// Aggregated depth snapshot: up to `depth` levels per side, bids
    /// descending, asks ascending.
    pub fn depth(&self, depth: usize) -> DepthSnapshot {
        DepthSnapshot {
            bids: self.bids.depth_snapshot(depth),
            asks: self.asks.depth_snapshot(depth),
        }
    }

    /// Resting order ids at a price, in time priority order.
    pub fn queue_at(&self, side: Side, price: Price) -> Vec<OrderId> {
        let level = match side {
            Side::BUY => self.bids.level(price),
            Side::SELL => self.asks.level(price),
        };
        match level {
            Some(level) => level
                .keys(&self.nodes)
                .into_iter()
                .map(|key| self.nodes[key].order.order_id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Aggregated quantity at a price, if the level exists.
    pub fn level_quantity(&self, side: Side, price: Price) -> Option<u64> {
        let level = match side {
            Side::BUY => self.bids.level(price),
            Side::SELL => self.asks.level(price),
        }?;
        Some(level.total_quantity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_order(side: Side, quantity: u64, cents: i64) -> Order {
        let mut order = Order::new(
            side,
            quantity,
            Price::from_cents(cents),
            None,
            1_708_123_456_789_000_000,
        );
        order.activate(order.created_at);
        order
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut book = Book::new();
        let order = active_order(Side::BUY, 10, 10_000);
        let order_id = order.order_id;

        book.insert(order);

        assert_eq!(book.len(), 1);
        assert!(book.contains(&order_id));
        let resting = book.get(&order_id).unwrap();
        assert!(resting.is_active);
        assert_eq!(book.best_bid(), Some((Price::from_cents(10_000), 10)));
    }

    #[test]
    fn test_remove_excises_everywhere() {
        let mut book = Book::new();
        let order = active_order(Side::SELL, 5, 10_100);
        let order_id = order.order_id;
        book.insert(order);

        let removed = book.remove(&order_id).unwrap();

        assert!(!removed.is_active);
        assert_eq!(removed.remaining_quantity, 5);
        assert!(!book.contains(&order_id));
        assert!(book.best_ask().is_none());
        assert_eq!(book.len(), 0);
    }

    #[test]
    fn test_remove_mid_queue_preserves_neighbors() {
        let mut book = Book::new();
        let first = active_order(Side::BUY, 1, 10_000);
        let second = active_order(Side::BUY, 2, 10_000);
        let third = active_order(Side::BUY, 3, 10_000);
        let ids = [first.order_id, second.order_id, third.order_id];

        book.insert(first);
        book.insert(second);
        book.insert(third);
        book.remove(&ids[1]);

        let queue = book.queue_at(Side::BUY, Price::from_cents(10_000));
        assert_eq!(queue, vec![ids[0], ids[2]]);
        assert_eq!(
            book.level_quantity(Side::BUY, Price::from_cents(10_000)),
            Some(4)
        );
    }

    #[test]
    fn test_empty_level_is_dropped() {
        let mut book = Book::new();
        let order = active_order(Side::BUY, 1, 10_000);
        let order_id = order.order_id;
        book.insert(order);

        book.remove(&order_id);

        assert_eq!(book.level_quantity(Side::BUY, Price::from_cents(10_000)), None);
    }

    #[test]
    fn test_fill_best_head_partial() {
        let mut book = Book::new();
        let maker = active_order(Side::SELL, 10, 10_100);
        let maker_id = maker.order_id;
        book.insert(maker);

        let after = book.fill_best_head(Side::SELL, 4, 1_708_123_456_790_000_000);

        assert_eq!(after.order_id, maker_id);
        assert_eq!(after.remaining_quantity, 6);
        assert_eq!(after.status, types::OrderStatus::PartiallyFilled);
        // Still at the head, aggregate reduced
        assert_eq!(book.best_ask(), Some((Price::from_cents(10_100), 6)));
        assert!(book.contains(&maker_id));
    }

    #[test]
    fn test_fill_best_head_complete_removes_order_and_level() {
        let mut book = Book::new();
        let maker = active_order(Side::SELL, 4, 10_100);
        let maker_id = maker.order_id;
        book.insert(maker);

        let after = book.fill_best_head(Side::SELL, 4, 1_708_123_456_790_000_000);

        assert!(after.is_filled());
        assert!(!book.contains(&maker_id));
        assert!(book.best_ask().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn test_depth_orders_both_sides() {
        let mut book = Book::new();
        book.insert(active_order(Side::BUY, 10, 10_000));
        book.insert(active_order(Side::BUY, 5, 9_900));
        book.insert(active_order(Side::SELL, 10, 10_100));
        book.insert(active_order(Side::SELL, 7, 10_300));

        let snapshot = book.depth(5);

        let bid_prices: Vec<i64> = snapshot.bids.iter().map(|l| l.price.as_cents()).collect();
        let ask_prices: Vec<i64> = snapshot.asks.iter().map(|l| l.price.as_cents()).collect();
        assert_eq!(bid_prices, vec![10_000, 9_900]);
        assert_eq!(ask_prices, vec![10_100, 10_300]);
    }

    #[test]
    fn test_depth_snapshot_serialization() {
        let mut book = Book::new();
        book.insert(active_order(Side::BUY, 10, 10_000));

        let json = serde_json::to_string(&book.depth(5)).unwrap();
        assert_eq!(json, r#"{"bids":[{"price":"100.00","quantity":10}],"asks":[]}"#);
    }

    #[test]
    #[should_panic(expected = "order already resting")]
    fn test_double_insert_panics() {
        let mut book = Book::new();
        let order = active_order(Side::BUY, 10, 10_000);
        book.insert(order.clone());
        book.insert(order);
    }
}
