use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{order, orderbook, trade, ws};
use crate::state::AppState;

/// Order intake and order queries (conceptually port A).
pub fn intake_router(state: AppState) -> Router {
    Router::new()
        .route("/orders/", post(order::create_order).get(order::list_orders))
        .route(
            "/orders/:id/",
            get(order::get_order)
                .put(order::modify_order)
                .delete(order::cancel_order),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Trade queries, settlement, and book snapshots (conceptually port B).
pub fn query_router(state: AppState) -> Router {
    Router::new()
        .route("/trades/", get(trade::list_trades))
        .route("/trades/:id/", get(trade::get_trade))
        .route("/trades/:id/settle/", post(trade::settle_trade))
        .route("/orderbook/", get(orderbook::get_orderbook))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket feeds (conceptually port C).
pub fn stream_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/trades/", get(ws::ws_trades))
        .route("/ws/orderbook/", get(ws::ws_orderbook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
