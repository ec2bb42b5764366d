use crate::counter::now_ns;
use crate::error::{AppError, Result};
use crate::models::MatchKind;
use crate::services::game_engine::choose_map;
use crate::services::match_runner::{MatchContext, MatchRequest, MatchRunner, match_players_info};
use crate::services::scrimmage::{MATCHES_PER_PLAYER, RankedScrimmageRequest, run_scrimmage};
use crate::services::tournament::{TournamentRequest, run_tournament};
use crate::state::{ActiveEngine, SharedState};
use axum::Json;
use axum::extract::State;

/// Clones the active engine so a batch never observes a mid-flight engine
/// change.
async fn engine_snapshot(state: &SharedState) -> Result<ActiveEngine> {
    state
        .engine
        .read()
        .await
        .clone()
        .ok_or(AppError::EngineMissing)
}

fn check_engine_name(engine: &ActiveEngine, requested: &str) -> Result<()> {
    if requested != engine.descriptor.game_engine_name {
        return Err(AppError::Validation("Incompatible game engine".to_string()));
    }
    Ok(())
}

/// Runs a single unranked match. The response is the runner's job
/// acknowledgement; the result lands in the matches table when the callback
/// fires.
pub async fn run_match(
    State(state): State<SharedState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<serde_json::Value>> {
    let engine = engine_snapshot(&state).await?;
    check_engine_name(&engine, &request.game_engine_name)?;

    if request.user_submissions.len() != engine.descriptor.num_players {
        return Err(AppError::Validation(format!(
            "Expected {} players, received {}",
            engine.descriptor.num_players,
            request.user_submissions.len()
        )));
    }
    if request.num_players != request.user_submissions.len() {
        return Err(AppError::Validation(
            "Number of users should match number of submissions".to_string(),
        ));
    }

    let game_map = choose_map(&engine.descriptor.map_choice, MatchKind::Unranked)?;
    let match_id = state.match_counter.next();
    let ctx = MatchContext::new(&engine, &state.config.callback_host);

    let runner = MatchRunner {
        runner: &state.runner,
        storage: &state.storage,
        ctx: &ctx,
        match_id,
        kind: MatchKind::Unranked,
        game_map,
        callback_path: "single_match_callback".to_string(),
    };
    let ack = runner.send_job(&request).await?;
    Ok(Json(ack))
}

/// Starts a ranked scrimmage batch and returns its id immediately; matches
/// run on a background worker and Elo is applied when the whole batch
/// finishes.
pub async fn run_scrimmage_batch(
    State(state): State<SharedState>,
    Json(request): Json<RankedScrimmageRequest>,
) -> Result<Json<serde_json::Value>> {
    let engine = engine_snapshot(&state).await?;
    check_engine_name(&engine, &request.game_engine_name)?;

    let players = match_players_info(&state.pool, &request.user_submissions).await?;
    if players.len() < MATCHES_PER_PLAYER {
        return Err(AppError::Validation(
            "too few rated players to run scrimmages".to_string(),
        ));
    }

    let scrimmage_id = now_ns();
    let entry = state.scrimmages.insert(scrimmage_id).await;
    let ctx = MatchContext::new(&engine, &state.config.callback_host);
    let maps = engine.descriptor.map_choice.clone();

    tokio::spawn(run_scrimmage(
        state.clone(),
        scrimmage_id,
        entry,
        request,
        players,
        ctx,
        maps,
    ));

    Ok(Json(serde_json::json!({ "scrimmage_id": scrimmage_id })))
}

/// Starts a tournament and returns its id immediately; the bracket document
/// is uploaded when the final series finishes.
pub async fn run_tournament_batch(
    State(state): State<SharedState>,
    Json(request): Json<TournamentRequest>,
) -> Result<Json<serde_json::Value>> {
    let engine = engine_snapshot(&state).await?;
    check_engine_name(&engine, &request.game_engine_name)?;

    if request.num_tournament_spots == 0 {
        return Err(AppError::Validation(
            "tournament needs at least one spot".to_string(),
        ));
    }

    let players = match_players_info(&state.pool, &request.user_submissions).await?;

    let tournament_id = now_ns();
    let entry = state.tournaments.insert(tournament_id).await;
    let ctx = MatchContext::new(&engine, &state.config.callback_host);
    let map_order = engine.descriptor.map_choice.tourney_map_order.clone();

    tokio::spawn(run_tournament(
        state.clone(),
        tournament_id,
        entry,
        request,
        players,
        ctx,
        map_order,
    ));

    Ok(Json(serde_json::json!({ "tournament_id": tournament_id })))
}
