//! Matching Engine Service
//!
//! Single-instrument limit order book with price-time priority matching.
//!
//! The book owns the truth for resting orders during a run; persistence is
//! write-through for durability and recovery only. All mutations are
//! serialized through one logical lane (see [`controller`]), which yields
//! deterministic ordering and keeps the matching loop free of locks.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced
//! - Execution price is always the resting side's price
//! - Conservation of quantity: traded + remaining = total, per order
//! - Level aggregates equal the sum of their queued remainders

pub mod book;
pub mod controller;
pub mod matching;

pub use book::{Book, DepthLevel, DepthSnapshot};
pub use controller::{spawn, BookHandle, PlaceOrder};
pub use matching::{match_order, MatchOutcome};
