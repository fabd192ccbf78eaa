//! Crossing detection logic
//!
//! Determines when an incoming order can trade against a resting level.

use types::{Price, Side};

/// Check if a bid and ask can match at given prices.
///
/// A cross at exactly equal prices is a valid match.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses a resting price.
pub fn crosses(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::BUY => can_match(incoming_price, resting_price),
        Side::SELL => can_match(resting_price, incoming_price),
    }
}
