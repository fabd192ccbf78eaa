//! Market Data Service
//!
//! Turns lane-consistent book state into client-facing feeds:
//! - Aggregated depth snapshots on a fixed cadence
//! - A public trade stream batched per snapshot interval
//! - The WebSocket client protocol (subscriptions are implicit per route;
//!   ping/pong keeps connections honest)
//!
//! Feeds fan out over broadcast channels carrying pre-serialized JSON, so
//! each message is rendered once no matter how many subscribers listen.

pub mod feed;
pub mod publisher;
pub mod trades;
pub mod websocket;

pub use feed::FeedHub;
pub use publisher::{run_publisher, PublisherConfig};
pub use trades::{TradeFeedMessage, TradeMessage};
