use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::broadcast;

use crate::state::AppState;
use market_data::websocket::handle_client_text;

pub async fn ws_orderbook(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let feed = state.hub.subscribe_book();
    ws.on_upgrade(move |socket| stream_feed(socket, feed, "orderbook"))
}

pub async fn ws_trades(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let feed = state.hub.subscribe_trades();
    ws.on_upgrade(move |socket| stream_feed(socket, feed, "trades"))
}

/// Pump feed payloads to the client while answering the JSON ping/pong
/// liveness exchange. Dropping the receiver on exit is what decrements the
/// hub's subscriber count and lets the publisher suppress idle feeds.
async fn stream_feed(mut socket: WebSocket, mut feed: broadcast::Receiver<String>, label: &'static str) {
    tracing::debug!(feed = label, "stream subscriber connected");
    loop {
        tokio::select! {
            update = feed.recv() => match update {
                Ok(payload) => {
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(feed = label, skipped, "slow stream subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_client_text(&text);
                    if socket.send(Message::Text(reply)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
    tracing::debug!(feed = label, "stream subscriber disconnected");
}
