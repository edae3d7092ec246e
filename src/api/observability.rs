use crate::api::{ApiResponse, AppState, HealthResponse};
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.prometheus_handle.as_ref().map_or_else(
        || "Metrics not enabled or failed to initialize".to_string(),
        metrics_exporter_prometheus::PrometheusHandle::render,
    )
}

/// `GET /health`
///
/// Liveness plus a database round-trip. Responds 503 when the ping fails.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        })),
    )
        .into_response()
}

/// Names the tracker view behind a matched route, for log and metric labels.
fn view_name(route: Option<&str>) -> &'static str {
    match route.map(|r| r.trim_end_matches('/')) {
        Some("") => "dashboard",
        Some("/members") => "member_rankings",
        Some("/members/{reg_number}") => "member_detail",
        Some("/leaderboard") => "leaderboard",
        Some("/static/{*path}") => "static",
        Some("/health") => "health",
        Some("/metrics") => "metrics",
        _ => "unmatched",
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let view = view_name(
        req.extensions()
            .get::<axum::extract::MatchedPath>()
            .map(axum::extract::MatchedPath::as_str),
    );

    let span = info_span!(
        "tracker_request",
        request_id = %request_id,
        method = %method,
        view = view,
    );

    async move {
        let response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();

        let labels = [
            ("view", view.to_string()),
            ("method", method),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("tracker_requests_total", &labels).increment(1);
        metrics::histogram!("tracker_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        if status.is_server_error() {
            warn!(path = %path, status = status.as_u16(), "View failed");
        } else {
            info!(
                path = %path,
                status = status.as_u16(),
                duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                "Served {}",
                view
            );
        }

        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_map_to_view_names() {
        assert_eq!(view_name(Some("/")), "dashboard");
        assert_eq!(view_name(Some("/members/")), "member_rankings");
        assert_eq!(view_name(Some("/members")), "member_rankings");
        assert_eq!(view_name(Some("/members/{reg_number}/")), "member_detail");
        assert_eq!(view_name(Some("/leaderboard")), "leaderboard");
        assert_eq!(view_name(Some("/static/{*path}")), "static");
        assert_eq!(view_name(None), "unmatched");
    }
}
