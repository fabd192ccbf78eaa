use axum::extract::{Query, State};
use axum::Json;

use crate::error::ApiError;
use crate::models::DepthQuery;
use crate::state::AppState;
use matching_engine::DepthSnapshot;

const MAX_DEPTH: usize = 20;

pub async fn get_orderbook(
    State(state): State<AppState>,
    Query(query): Query<DepthQuery>,
) -> Result<Json<DepthSnapshot>, ApiError> {
    let depth = query.depth.unwrap_or(5);
    if depth == 0 || depth > MAX_DEPTH {
        return Err(ApiError::validation(format!(
            "depth must be between 1 and {MAX_DEPTH}"
        )));
    }
    let snapshot = state.lane.depth(depth).await?;
    Ok(Json(snapshot))
}
