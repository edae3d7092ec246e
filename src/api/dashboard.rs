use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::DashboardSummary;

/// `GET /`
///
/// Team-wide counters, the latest members and tasks, and the top five
/// members by completed-task credits.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let summary = state.tracker_service().dashboard().await?;
    Ok(Json(ApiResponse::success(summary)))
}
