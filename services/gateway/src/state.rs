use std::sync::Arc;

use market_data::FeedHub;
use matching_engine::BookHandle;
use persistence::Store;

/// Shared application state for all three routers.
#[derive(Clone)]
pub struct AppState {
    /// Serialized mutation lane for the book
    pub lane: BookHandle,
    /// Durable storage, read directly by the query paths
    pub store: Arc<dyn Store>,
    /// Streaming fan-out point
    pub hub: FeedHub,
}

impl AppState {
    pub fn new(lane: BookHandle, store: Arc<dyn Store>, hub: FeedHub) -> Self {
        Self { lane, store, hub }
    }
}
