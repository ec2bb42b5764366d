//! Runner-facing callback routes.
//!
//! The runner POSTs the job's raw output file as the request body when a
//! match finishes. These handlers parse it, persist the replay, and route
//! the result to whatever is waiting on it. A 400 response tells the runner
//! the output was unusable.

use crate::error::Result;
use crate::state::SharedState;
use crate::storage::{DEFAULT_REPLAY_TTL, ProcessedReplay};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;

/// Marks the match failed and keeps the raw output for inspection, then
/// propagates the original error.
async fn record_failure(state: &SharedState, match_id: i64, raw: &[u8]) {
    if let Err(err) = state.storage.update_failed_match(match_id).await {
        tracing::warn!(match_id, %err, "could not mark match failed");
    }
    if let Err(err) = state
        .storage
        .store_error_log(raw, &format!("failed-{match_id}.txt"))
        .await
    {
        tracing::warn!(match_id, %err, "could not store error log");
    }
}

/// Completion callback for one-off unranked matches. Nothing waits on these
/// in memory; the row update is the whole story.
pub async fn single_match_callback(
    State(state): State<SharedState>,
    Path(match_id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode> {
    tracing::info!(match_id, size = body.len(), "received single match callback");

    let dest_filename = format!("unranked-{match_id}.json");
    match state.storage.process_replay(&body, &dest_filename).await {
        Ok(ProcessedReplay {
            winner,
            replay_filename,
        }) => {
            let replay_url = if replay_filename.is_empty() {
                String::new()
            } else {
                state
                    .storage
                    .replay_url(&replay_filename, DEFAULT_REPLAY_TTL)
                    .await?
            };
            state
                .storage
                .update_finished_match(
                    match_id,
                    &format!("team{winner}"),
                    &replay_filename,
                    &replay_url,
                    0,
                )
                .await?;
            Ok(StatusCode::OK)
        }
        Err(err) => {
            record_failure(&state, match_id, &body).await;
            Err(err)
        }
    }
}

/// Completion callback for one match of a ranked scrimmage batch. The
/// registered batch callback applies Elo and records the row; this handler
/// only parses and routes.
pub async fn scrimmage_callback(
    State(state): State<SharedState>,
    Path((scrimmage_id, match_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<StatusCode> {
    tracing::info!(scrimmage_id, match_id, "received scrimmage callback");

    let Some(entry) = state.scrimmages.get(scrimmage_id).await else {
        return Err(crate::error::AppError::Validation(format!(
            "no ongoing scrimmage {scrimmage_id}"
        )));
    };

    let dest_filename = format!("ranked_scrimmage-{match_id}.json");
    match state.storage.process_replay(&body, &dest_filename).await {
        Ok(processed) => {
            entry
                .fire(match_id, processed.winner, &processed.replay_filename)
                .await;
            Ok(StatusCode::OK)
        }
        Err(err) => {
            record_failure(&state, match_id, &body).await;
            entry.fire(match_id, -1, "").await;
            Err(err)
        }
    }
}

/// Completion callback for one map of a tournament series. Deposits the
/// winner into the series slot the orchestrator is blocked on.
pub async fn tournament_callback(
    State(state): State<SharedState>,
    Path((tournament_id, match_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<StatusCode> {
    tracing::info!(tournament_id, match_id, "received tournament callback");

    let Some(entry) = state.tournaments.get(tournament_id).await else {
        return Err(crate::error::AppError::Validation(format!(
            "no ongoing tournament {tournament_id}"
        )));
    };

    let dest_filename = format!("tournament-{match_id}.json");
    match state.storage.process_replay(&body, &dest_filename).await {
        Ok(processed) => {
            entry
                .fire(match_id, processed.winner, &processed.replay_filename)
                .await;
            Ok(StatusCode::OK)
        }
        Err(err) => {
            record_failure(&state, match_id, &body).await;
            entry.fire(match_id, -1, "").await;
            Err(err)
        }
    }
}
