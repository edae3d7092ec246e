use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::Leaderboard;

/// `GET /leaderboard/`
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Leaderboard>>, ApiError> {
    let leaderboard = state.tracker_service().leaderboard().await?;
    Ok(Json(ApiResponse::success(leaderboard)))
}
