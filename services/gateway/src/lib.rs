//! Gateway service
//!
//! HTTP and WebSocket boundary for the matching system, presented as three
//! listeners sharing one application state:
//! - intake (order placement, modification, cancellation, order queries)
//! - query (trades, settlement, order book snapshots)
//! - stream (periodic WebSocket feeds)

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

pub use config::GatewayConfig;
pub use router::{intake_router, query_router, stream_router};
pub use state::AppState;
