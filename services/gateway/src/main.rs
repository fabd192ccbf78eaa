use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use gateway::{intake_router, query_router, stream_router, AppState, GatewayConfig};
use market_data::{FeedHub, PublisherConfig};
use persistence::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    tracing::info!("starting matching gateway");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set; falling back to in-memory storage");
            Arc::new(MemoryStore::new())
        }
    };

    let lane = matching_engine::spawn(store.clone()).await?;

    let hub = FeedHub::new();
    tokio::spawn(market_data::run_publisher(
        lane.clone(),
        hub.clone(),
        PublisherConfig {
            interval: config.snapshot_interval,
            depth: config.snapshot_depth,
        },
    ));

    let state = AppState::new(lane, store, hub);

    let intake = TcpListener::bind(config.intake_addr()).await?;
    let query = TcpListener::bind(config.query_addr()).await?;
    let stream = TcpListener::bind(config.stream_addr()).await?;
    tracing::info!(
        intake = %config.intake_addr(),
        query = %config.query_addr(),
        stream = %config.stream_addr(),
        "listening"
    );

    tokio::try_join!(
        async { axum::serve(intake, intake_router(state.clone())).await },
        async { axum::serve(query, query_router(state.clone())).await },
        async { axum::serve(stream, stream_router(state.clone())).await },
    )?;

    Ok(())
}
