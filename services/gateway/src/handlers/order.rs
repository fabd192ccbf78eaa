use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    ListOrdersQuery, ModifyOrderRequest, OrderListResponse, OrderResponse, Pagination,
    PlaceOrderRequest,
};
use crate::state::AppState;
use matching_engine::PlaceOrder;
use persistence::Page;
use types::ids::{OrderId, OwnerId};
use types::EngineError;

pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::validation(err.body_text()))?;

    let order = state
        .lane
        .place(PlaceOrder {
            side: request.side,
            quantity: request.quantity,
            price: request.price,
            owner_id: request.owner_id.map(OwnerId::from_uuid),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let filter = query.filter()?;
    let page = Page::new(query.page, query.page_size);
    let result = state.store.list_orders(&filter, page).await?;

    Ok(Json(OrderListResponse {
        pagination: Pagination::from_result(&result),
        orders: result.items.iter().map(OrderResponse::from).collect(),
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| EngineError::OrderNotFound(order_id.to_string()))?;
    Ok(Json(OrderResponse::from(&order)))
}

pub async fn modify_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ModifyOrderRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Json(request) = payload.map_err(|err| ApiError::validation(err.body_text()))?;
    let order = state
        .lane
        .modify(OrderId::from_uuid(id), request.price)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.lane.cancel(OrderId::from_uuid(id)).await?;
    Ok(Json(OrderResponse::from(&order)))
}
