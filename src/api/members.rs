use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::{MemberDetail, MemberRankings};

/// `GET /members/`
pub async fn list_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<MemberRankings>>, ApiError> {
    let rankings = state.tracker_service().member_rankings().await?;
    Ok(Json(ApiResponse::success(rankings)))
}

/// `GET /members/{reg_number}/`
///
/// Responds with 404 when no member has the registration number.
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(reg_number): Path<String>,
) -> Result<Json<ApiResponse<MemberDetail>>, ApiError> {
    let detail = state.tracker_service().member_detail(&reg_number).await?;
    Ok(Json(ApiResponse::success(detail)))
}
