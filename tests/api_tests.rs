use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use team_tracker::config::Config;
use team_tracker::db::Store;
use team_tracker::models::member::NewMember;
use team_tracker::services::{TaskDraft, TrackerService};
use team_tracker::state::SharedState;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<SharedState>) {
    let store = Store::in_memory()
        .await
        .expect("Failed to open in-memory store");
    let shared = Arc::new(SharedState::with_store(Config::default(), store));
    let state = team_tracker::api::create_app_state(shared.clone(), None);
    (team_tracker::api::router(state).await, shared)
}

async fn add_member(shared: &SharedState, name: &str, reg: &str) {
    shared
        .tracker_service
        .create_member(NewMember {
            name: name.to_string(),
            reg_number: reg.to_string(),
            email: format!("{}@example.com", reg.to_lowercase()),
        })
        .await
        .unwrap();
}

async fn add_task(shared: &SharedState, reg: &str, credits: u32, done: bool) {
    shared
        .tracker_service
        .create_task(
            reg,
            TaskDraft {
                title: format!("Task worth {credits}"),
                credits,
                is_completed: done,
                ..TaskDraft::default()
            },
        )
        .await
        .unwrap();
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

/// Three members with 100, 100 and 50 credits plus one pending task.
async fn seed_tie_scenario(shared: &SharedState) {
    add_member(shared, "Charlie", "REG003").await;
    add_member(shared, "Alice", "REG001").await;
    add_member(shared, "Bob", "REG002").await;

    add_task(shared, "REG001", 50, true).await;
    add_task(shared, "REG002", 60, true).await;
    add_task(shared, "REG002", 40, true).await;
    add_task(shared, "REG003", 100, true).await;
    add_task(shared, "REG003", 30, false).await;
}

#[tokio::test]
async fn test_dashboard_on_empty_database() {
    let (app, _) = spawn_app().await;

    let (status, json) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let data = &json["data"];
    assert_eq!(data["total_members"], 0);
    assert_eq!(data["total_tasks"], 0);
    assert_eq!(data["total_credits"], 0);
    assert_eq!(data["completion_rate"], 0.0);
    assert_eq!(data["top_performers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_totals() {
    let (app, shared) = spawn_app().await;
    seed_tie_scenario(&shared).await;

    let (status, json) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(data["total_members"], 3);
    assert_eq!(data["total_tasks"], 5);
    assert_eq!(data["completed_tasks"], 4);
    assert_eq!(data["total_credits"], 250);
    assert_eq!(data["completion_rate"], 80.0);
    assert_eq!(data["recent_tasks"].as_array().unwrap().len(), 5);
    assert!(data["recent_tasks"][0]["member_name"].is_string());
}

#[tokio::test]
async fn test_member_rankings_order() {
    let (app, shared) = spawn_app().await;
    seed_tie_scenario(&shared).await;

    for uri in ["/members/", "/members"] {
        let (status, json) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");

        let members = json["data"]["members"].as_array().unwrap();
        let names: Vec<&str> = members
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Bob", "Charlie", "Alice"]);
        assert_eq!(members[0]["rank"], 1);
        assert_eq!(members[2]["total_credits"], 50);
        assert_eq!(json["data"]["total_members"], 3);
        assert_eq!(json["data"]["top_performer"]["reg_number"], "REG002");
    }
}

#[tokio::test]
async fn test_member_detail() {
    let (app, shared) = spawn_app().await;
    seed_tie_scenario(&shared).await;

    let (status, json) = get_json(&app, "/members/REG003/").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(data["member"]["name"], "Charlie");
    assert_eq!(data["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(data["completed_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(data["pending_tasks"].as_array().unwrap().len(), 1);
    assert_eq!(data["total_credits"], 100);
    assert_eq!(data["completion_rate"], 50.0);
}

#[tokio::test]
async fn test_unknown_member_is_404() {
    let (app, _) = spawn_app().await;

    let (status, json) = get_json(&app, "/members/NOPE/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("NOPE"));
}

#[tokio::test]
async fn test_leaderboard_podium() {
    let (app, shared) = spawn_app().await;
    seed_tie_scenario(&shared).await;

    let (status, json) = get_json(&app, "/leaderboard/").await;
    assert_eq!(status, StatusCode::OK);

    let data = &json["data"];
    assert_eq!(data["first_place"]["name"], "Bob");
    assert_eq!(data["second_place"]["name"], "Charlie");
    assert_eq!(data["third_place"]["name"], "Alice");
    assert_eq!(data["members"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_leaderboard_with_two_members() {
    let (app, shared) = spawn_app().await;
    add_member(&shared, "Solo", "REG001").await;
    add_member(&shared, "Duo", "REG002").await;

    let (_, json) = get_json(&app, "/leaderboard").await;
    let data = &json["data"];
    assert!(data["first_place"].is_object());
    assert!(data["second_place"].is_object());
    assert!(data["third_place"].is_null());
}

#[tokio::test]
async fn test_health_and_static() {
    let (app, _) = spawn_app().await;

    let (status, json) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["database"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/static/tracker.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css");

    let (status, _) = get_json(&app, "/static/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
