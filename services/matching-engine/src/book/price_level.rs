//! Price level with a FIFO order queue
//!
//! A price level holds every resting order at one price, in arrival order.
//! The queue is a doubly linked list threaded through the book's shared
//! slab:
//!
//! ```text
//! head (oldest) <-> ... <-> tail (newest)
//! ```
//!
//! New orders append at the tail; matching consumes from the head; any
//! order is removable in O(1) given its slab key. The level caches the
//! aggregated remaining quantity, which must always equal the sum of its
//! queued orders' remainders.

use slab::Slab;

use super::node::OrderNode;
use types::Price;

/// All resting orders at a single price.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Price shared by every order in the queue
    pub price: Price,
    /// Aggregated remaining quantity across the queue
    total_quantity: u64,
    /// Oldest order (matched first), as a slab key
    head: Option<usize>,
    /// Newest order, as a slab key
    tail: Option<usize>,
    /// Number of queued orders
    order_count: usize,
}

impl PriceLevel {
    /// Create an empty level at the given price
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Aggregated remaining quantity at this level
    #[inline]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Number of orders queued at this level
    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Oldest queued order's slab key
    #[inline]
    pub fn peek_head(&self) -> Option<usize> {
        self.head
    }

    /// Append an order at the tail of the queue (time priority)
    ///
    /// # Panics
    /// Panics if `key` is not present in the slab.
    pub fn push_back(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let node = slab.get_mut(key).expect("invalid slab key");
        let quantity = node.remaining();

        node.prev = self.tail;
        node.next = None;

        if let Some(tail_key) = self.tail {
            let tail_node = slab.get_mut(tail_key).expect("invalid tail key");
            tail_node.next = Some(key);
        } else {
            self.head = Some(key);
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_quantity += quantity;
    }

    /// Unlink an order from anywhere in the queue
    ///
    /// Returns the removed order's remaining quantity. The node itself stays
    /// in the slab; the caller decides whether to drop it.
    ///
    /// # Panics
    /// Panics if `key` is not present in the slab.
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> u64 {
        let node = slab.get(key).expect("invalid slab key");
        let quantity = node.remaining();
        let prev_key = node.prev;
        let next_key = node.next;

        if let Some(prev) = prev_key {
            slab.get_mut(prev).expect("invalid prev key").next = next_key;
        } else {
            self.head = next_key;
        }

        if let Some(next) = next_key {
            slab.get_mut(next).expect("invalid next key").prev = prev_key;
        } else {
            self.tail = prev_key;
        }

        let node = slab.get_mut(key).expect("invalid slab key");
        node.prev = None;
        node.next = None;

        self.order_count -= 1;
        self.total_quantity = self.total_quantity.saturating_sub(quantity);

        quantity
    }

    /// Deduct a partial fill from the aggregated quantity
    pub fn reduce_quantity(&mut self, filled_quantity: u64) {
        self.total_quantity = self.total_quantity.saturating_sub(filled_quantity);
    }

    /// Queue contents in priority order, as slab keys
    pub fn keys(&self, slab: &Slab<OrderNode>) -> Vec<usize> {
        let mut keys = Vec::with_capacity(self.order_count);
        let mut cursor = self.head;
        while let Some(key) = cursor {
            keys.push(key);
            cursor = slab.get(key).expect("invalid queue key").next;
        }
        keys
    }
}
