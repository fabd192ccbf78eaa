//! Broadcast hub for streaming subscribers
//!
//! Two independent channels — book snapshots and trade batches — carrying
//! pre-serialized JSON. Subscriber counts drive the publisher's
//! suppression logic: nothing is rendered or sent while a channel has no
//! listeners.

use matching_engine::DepthSnapshot;
use tokio::sync::broadcast;
use types::Trade;

use crate::trades::TradeFeedMessage;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out point shared by the publisher and the WebSocket handlers.
#[derive(Debug, Clone)]
pub struct FeedHub {
    book_tx: broadcast::Sender<String>,
    trades_tx: broadcast::Sender<String>,
}

impl FeedHub {
    pub fn new() -> Self {
        let (book_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (trades_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { book_tx, trades_tx }
    }

    /// Subscribe to periodic book snapshots.
    pub fn subscribe_book(&self) -> broadcast::Receiver<String> {
        self.book_tx.subscribe()
    }

    /// Subscribe to periodic trade batches.
    pub fn subscribe_trades(&self) -> broadcast::Receiver<String> {
        self.trades_tx.subscribe()
    }

    pub fn book_subscribers(&self) -> usize {
        self.book_tx.receiver_count()
    }

    pub fn trade_subscribers(&self) -> usize {
        self.trades_tx.receiver_count()
    }

    /// Render and broadcast a book snapshot.
    pub fn publish_book(&self, snapshot: &DepthSnapshot) {
        match serde_json::to_string(snapshot) {
            // Send fails only when every receiver is gone; that is fine
            Ok(payload) => {
                let _ = self.book_tx.send(payload);
            }
            Err(err) => tracing::error!(%err, "failed to serialize book snapshot"),
        }
    }

    /// Render and broadcast a trade batch.
    pub fn publish_trades(&self, trades: &[Trade]) {
        match serde_json::to_string(&TradeFeedMessage::new(trades)) {
            Ok(payload) => {
                let _ = self.trades_tx.send(payload);
            }
            Err(err) => tracing::error!(%err, "failed to serialize trade batch"),
        }
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matching_engine::DepthLevel;
    use types::{OrderId, Price};

    #[test]
    fn test_subscriber_counts() {
        let hub = FeedHub::new();
        assert_eq!(hub.book_subscribers(), 0);
        assert_eq!(hub.trade_subscribers(), 0);

        let book_rx = hub.subscribe_book();
        let trades_rx = hub.subscribe_trades();
        assert_eq!(hub.book_subscribers(), 1);
        assert_eq!(hub.trade_subscribers(), 1);

        drop(book_rx);
        drop(trades_rx);
        assert_eq!(hub.book_subscribers(), 0);
    }

    #[tokio::test]
    async fn test_publish_book_reaches_subscriber() {
        let hub = FeedHub::new();
        let mut rx = hub.subscribe_book();

        hub.publish_book(&DepthSnapshot {
            bids: vec![DepthLevel {
                price: Price::from_cents(10_000),
                quantity: 10,
            }],
            asks: vec![],
        });

        let payload = rx.recv().await.unwrap();
        assert_eq!(
            payload,
            r#"{"bids":[{"price":"100.00","quantity":10}],"asks":[]}"#
        );
    }

    #[tokio::test]
    async fn test_publish_trades_reaches_subscriber() {
        let hub = FeedHub::new();
        let mut rx = hub.subscribe_trades();

        let trade = Trade::new(
            Price::from_cents(10_100),
            4,
            OrderId::new(),
            OrderId::new(),
            1_708_123_456_789_000_000,
        );
        hub.publish_trades(&[trade]);

        let payload = rx.recv().await.unwrap();
        assert!(payload.starts_with(r#"{"trades":[{"#));
        assert!(payload.contains("\"101.00\""));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let hub = FeedHub::new();
        hub.publish_trades(&[]);
        hub.publish_book(&DepthSnapshot {
            bids: vec![],
            asks: vec![],
        });
    }
}
