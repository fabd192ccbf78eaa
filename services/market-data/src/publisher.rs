//! Periodic snapshot publisher
//!
//! Ticks at a fixed wall-clock interval. Each tick drains the lane's trade
//! cursor — keeping the cursor fresh even while nobody listens — and, when
//! subscribers exist, emits the trade batch and a lane-consistent depth
//! snapshot. Lane errors are logged and the loop keeps going; the feed is
//! best-effort by design.

use std::time::Duration;

use matching_engine::BookHandle;
use tokio::time::MissedTickBehavior;

use crate::feed::FeedHub;

/// Publisher cadence and depth settings.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Emit interval (default 1 s)
    pub interval: Duration,
    /// Price levels per side in book snapshots (default 5)
    pub depth: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            depth: 5,
        }
    }
}

/// Run the publish loop until the lane goes away.
pub async fn run_publisher(lane: BookHandle, hub: FeedHub, config: PublisherConfig) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cursor = 0u64;

    tracing::info!(interval_ms = config.interval.as_millis() as u64, depth = config.depth, "snapshot publisher started");

    loop {
        ticker.tick().await;

        match lane.trades_since(cursor).await {
            Ok((next_cursor, trades)) => {
                cursor = next_cursor;
                if hub.trade_subscribers() > 0 {
                    hub.publish_trades(&trades);
                }
            }
            Err(err) => {
                tracing::warn!(%err, "trade feed tick failed");
                return;
            }
        }

        if hub.book_subscribers() > 0 {
            match lane.depth(config.depth).await {
                Ok(snapshot) => hub.publish_book(&snapshot),
                Err(err) => {
                    tracing::warn!(%err, "book feed tick failed");
                    return;
                }
            }
        }
    }
}
