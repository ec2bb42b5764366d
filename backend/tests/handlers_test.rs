mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use bot_arena_backend::handlers;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let app = handlers::router(common::test_state());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Everything is OK");
}

#[tokio::test]
async fn test_match_without_engine_is_rejected() {
    let app = handlers::router(common::test_state());

    let request_body = serde_json::json!({
        "game_engine_name": "supercell",
        "num_players": 2,
        "user_submissions": [
            {"username": "a", "bucket": "bots", "object_key": "a.py"},
            {"username": "b", "bucket": "bots", "object_key": "b.py"}
        ]
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/match")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::BAD_REQUEST,
        "a match cannot run before an engine is set"
    );
    let body = body_json(response).await;
    assert_eq!(body["detail"], "Game engine not set yet");
}

#[tokio::test]
async fn test_scrimmage_without_engine_is_rejected() {
    let app = handlers::router(common::test_state());

    let request_body = serde_json::json!({
        "game_engine_name": "supercell",
        "user_submissions": []
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scrimmage")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_for_unknown_scrimmage_is_rejected() {
    let app = handlers::router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/scrimmage_callback/12345/1")
                .body(Body::from("===== RED BROKEN =====\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::BAD_REQUEST,
        "callbacks for batches we are not tracking are rejected"
    );
}

#[tokio::test]
async fn test_callback_for_unknown_tournament_is_rejected() {
    let app = handlers::router(common::test_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tournament_callback/9/1")
                .body(Body::from("no sentinel here"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
