//! Matching kernel
//!
//! Crosses one incoming order against the book under strict price-time
//! priority and emits the resulting trades. The kernel is a pure state
//! transition over the book: given well-formed input it cannot fail, and
//! any invariant breach observed mid-match is a programmer error that
//! panics rather than returning.

use crate::book::Book;
use crate::matching::crossing;
use types::{Order, Side, Trade};

/// Everything a single kernel pass produced.
///
/// `maker_updates` carries the post-fill state of every resting order the
/// pass touched, so the caller can write each transition through to
/// storage. `taker` is the incoming order's final state: resting, partially
/// filled and resting, or fully filled.
#[derive(Debug)]
pub struct MatchOutcome {
    pub trades: Vec<Trade>,
    pub maker_updates: Vec<Order>,
    pub taker: Order,
}

/// Match an incoming order against the opposing side of the book.
///
/// Fills walk the opposing side best level first and each level's queue in
/// arrival order. Every execution happens at the resting order's price, so
/// an aggressive order that crosses through worse prices gets price
/// improvement. Whatever remains afterwards is admitted at the tail of the
/// level at the order's own limit price.
pub fn match_order(book: &mut Book, mut taker: Order, now: i64) -> MatchOutcome {
    assert!(
        taker.remaining_quantity > 0,
        "zero-remaining orders are rejected at intake"
    );

    let opposing = taker.side.opposite();
    let mut trades = Vec::new();
    let mut maker_updates = Vec::new();

    while taker.remaining_quantity > 0 {
        let Some(best_price) = book.best_price(opposing) else {
            break;
        };
        if !crossing::crosses(taker.side, taker.price, best_price) {
            break;
        }

        let (maker_id, maker_remaining, maker_price) = book
            .head_of_best(opposing)
            .expect("non-empty side has a head order");
        debug_assert_eq!(maker_price, best_price, "head order carries the level price");

        let fill = taker.remaining_quantity.min(maker_remaining);
        let (bid_order_id, ask_order_id) = match taker.side {
            Side::BUY => (taker.order_id, maker_id),
            Side::SELL => (maker_id, taker.order_id),
        };

        trades.push(Trade::new(maker_price, fill, bid_order_id, ask_order_id, now));
        taker.apply_fill(fill, maker_price, now);

        let maker = book.fill_best_head(opposing, fill, now);
        debug_assert_eq!(maker.order_id, maker_id);
        maker_updates.push(maker);
    }

    if taker.remaining_quantity > 0 {
        book.insert(taker.clone());
        taker.is_active = true;
    }

    MatchOutcome {
        trades,
        maker_updates,
        taker,
    }
}
