//! Ask (sell-side) price level index
//!
//! Sell levels sorted by price with the lowest — the best ask — accessed
//! first. Mirror image of the bid book.

use std::collections::BTreeMap;

use super::price_level::PriceLevel;
use super::DepthLevel;
use types::Price;

/// Sell side of the book: price → level, traversed lowest-first.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Lowest ask price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Lowest-priced level
    pub fn best_level(&self) -> Option<(Price, &PriceLevel)> {
        self.levels.iter().next().map(|(p, l)| (*p, l))
    }

    /// Mutable access to the lowest-priced level
    pub fn best_level_mut(&mut self) -> Option<(Price, &mut PriceLevel)> {
        self.levels.iter_mut().next().map(|(p, l)| (*p, l))
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
            "removed a non-empty ask level"
        );
    }

    /// Top `depth` levels, best (lowest) first
    pub fn depth_snapshot(&self, depth: usize) -> Vec<DepthLevel> {
        self.levels
            .iter()
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
