//! Bid (buy-side) price level index
//!
//! Buy levels sorted by price with the highest — the best bid — accessed
//! first. `BTreeMap` gives O(log P) level insert/erase and deterministic
//! iteration; best-side access rides the map's last entry.

use std::collections::BTreeMap;

use super::price_level::PriceLevel;
use super::DepthLevel;
use types::Price;

/// Buy side of the book: price → level, traversed highest-first.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Highest bid price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Highest-priced level
    pub fn best_level(&self) -> Option<(Price, &PriceLevel)> {
        self.levels.iter().next_back().map(|(p, l)| (*p, l))
    }

    /// Mutable access to the highest-priced level
    pub fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels.iter_mut().next_back().map(|(p, l)| (*p, l))
    }

    /// Level at an exact price
    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Mutable level at an exact price
    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Existing level at the price, or a freshly created empty one
    pub fn get_or_create(&mut self, price: Price) -> &mut PriceLevel {
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
    }

    /// Drop a level; called only once its queue has emptied
    pub fn remove_level(&mut self, price: Price) {
        let removed = self.levels.remove(&price);
        debug_assert!(
            removed.map(|l| l.is_empty()).unwrap_or(true),
            "removed a non-empty bid level"
        );
    }

    /// Top `depth` levels, best (highest) first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<DepthLevel> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| DepthLevel {
                price: *price,
                quantity: level.total_quantity(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
