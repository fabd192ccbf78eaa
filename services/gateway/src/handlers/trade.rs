use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{ListTradesQuery, Pagination, TradeListResponse, TradeResponse};
use crate::state::AppState;
use persistence::Page;
use types::ids::TradeId;
use types::time::now_nanos;
use types::EngineError;

pub async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<ListTradesQuery>,
) -> Result<Json<TradeListResponse>, ApiError> {
    let page = Page::new(query.page, query.page_size);
    let result = state.store.list_trades(page).await?;

    Ok(Json(TradeListResponse {
        pagination: Pagination::from_result(&result),
        trades: result.items.iter().map(TradeResponse::from).collect(),
    }))
}

pub async fn get_trade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TradeResponse>, ApiError> {
    let trade_id = TradeId::from_uuid(id);
    let trade = state
        .store
        .get_trade(trade_id)
        .await?
        .ok_or_else(|| EngineError::TradeNotFound(trade_id.to_string()))?;
    Ok(Json(TradeResponse::from(&trade)))
}

/// One-shot settlement; settling twice is a state conflict and the book is
/// never involved.
pub async fn settle_trade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TradeResponse>, ApiError> {
    let trade = state
        .store
        .settle_trade(TradeId::from_uuid(id), now_nanos())
        .await?;
    Ok(Json(TradeResponse::from(&trade)))
}
