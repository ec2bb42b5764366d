//! HTTP surface.
//!
//! Thin axum handlers over the services: request validation and engine
//! checks happen here, orchestration happens in `services`, and the three
//! callback routes are what the runner POSTs job output to.

pub mod callbacks;
pub mod engine;
pub mod matches;

use crate::state::SharedState;
use axum::Json;
use axum::Router;
use axum::routing::{get, post};

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Everything is OK" }))
}

/// Builds the full route table over the shared application context.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/game_engine", post(engine::set_game_engine))
        .route("/game_engine_reload", post(engine::reload_game_engine))
        .route("/match", post(matches::run_match))
        .route("/scrimmage", post(matches::run_scrimmage_batch))
        .route("/tournament", post(matches::run_tournament_batch))
        .route(
            "/single_match_callback/{match_id}",
            post(callbacks::single_match_callback),
        )
        .route(
            "/scrimmage_callback/{scrimmage_id}/{match_id}",
            post(callbacks::scrimmage_callback),
        )
        .route(
            "/tournament_callback/{tournament_id}/{match_id}",
            post(callbacks::tournament_callback),
        )
        .with_state(state)
}
