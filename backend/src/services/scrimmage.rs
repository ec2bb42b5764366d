//! Ranked Scrimmage Orchestrator
//!
//! A scrimmage takes a set of rated submissions, pairs each one against
//! neighbours of similar rating, runs every pairing in parallel through the
//! runner, and applies the accumulated Elo movement in one pass when the
//! whole batch has finished.
//!
//! ## Batch workflow
//!
//! 1. Sort players by rating and build the deduplicated pairing set
//! 2. Register a callback per pairing, then submit its job
//! 3. Block on the batch semaphore until every pairing has fired
//! 4. Write the new ratings through the storage adapter
//!
//! Callbacks fold per-match deltas into a shared accumulator under a mutex,
//! so the order they arrive in does not matter.

use crate::models::MatchKind;
use crate::services::game_engine::{MapSelection, choose_map};
use crate::services::match_runner::{
    MatchContext, MatchPlayer, MatchRequest, MatchRunner, UserSubmission,
};
use crate::services::registry::{RankedCallback, ScrimmageEntry};
use crate::state::SharedState;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Pairings per player: half against better-rated neighbours, half against
/// worse. Must stay even and below the minimum accepted batch size.
pub const MATCHES_PER_PLAYER: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct RankedScrimmageRequest {
    pub user_submissions: Vec<UserSubmission>,
    pub game_engine_name: String,
}

/// Builds the pairing set over players sorted by rating, best first.
///
/// Each player is paired with a window of `MATCHES_PER_PLAYER` neighbours
/// centred on its own index, clamped to the table edges. Pairs are
/// deduplicated and normalized as `(lower-rated index, higher-rated index)`,
/// so the returned `.0` is always the worse seed.
pub fn build_pairings(player_count: usize) -> Vec<(usize, usize)> {
    let k = MATCHES_PER_PLAYER;
    let mut pairs: HashSet<(usize, usize)> = HashSet::new();

    if player_count < 2 {
        return Vec::new();
    }

    let window_start_max = player_count.saturating_sub(1 + k);
    for i in 0..player_count {
        let base = i.saturating_sub(k / 2).min(window_start_max);
        for j in base..=(base + k).min(player_count - 1) {
            if j != i {
                pairs.insert((i.max(j), i.min(j)));
            }
        }
    }

    let mut pairs: Vec<_> = pairs.into_iter().collect();
    pairs.sort_unstable();
    pairs
}

/// Batch worker. Runs on its own task; the submitting handler has already
/// returned the scrimmage id to the caller.
pub async fn run_scrimmage(
    state: SharedState,
    scrimmage_id: i64,
    entry: Arc<ScrimmageEntry>,
    request: RankedScrimmageRequest,
    players: Vec<MatchPlayer>,
    ctx: MatchContext,
    maps: MapSelection,
) {
    let pairings = build_pairings(players.len());
    tracing::info!(
        scrimmage_id,
        players = players.len(),
        matches = pairings.len(),
        "running ranked scrimmage"
    );

    let net_elo_changes: Arc<Mutex<HashMap<String, i32>>> = Arc::new(Mutex::new(
        players
            .iter()
            .map(|p| (p.user.username.clone(), 0))
            .collect(),
    ));

    for &(low_seed, high_seed) in &pairings {
        let player_1 = players[low_seed].clone();
        let player_2 = players[high_seed].clone();
        let match_id = state.match_counter.next();

        entry
            .register(
                match_id,
                RankedCallback {
                    player_1: player_1.clone(),
                    player_2: player_2.clone(),
                    match_id,
                    net_elo_changes: net_elo_changes.clone(),
                    storage: state.storage.clone(),
                },
            )
            .await;

        let game_map = match choose_map(&maps, MatchKind::Ranked) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(scrimmage_id, match_id, %err, "no ranked map available");
                entry.fire(match_id, -1, "").await;
                continue;
            }
        };

        let match_request = MatchRequest {
            game_engine_name: request.game_engine_name.clone(),
            num_players: 2,
            user_submissions: vec![player_1.user.clone(), player_2.user.clone()],
        };
        let runner = MatchRunner {
            runner: &state.runner,
            storage: &state.storage,
            ctx: &ctx,
            match_id,
            kind: MatchKind::Ranked,
            game_map,
            callback_path: format!("scrimmage_callback/{scrimmage_id}"),
        };

        if let Err(err) = runner.send_job(&match_request).await {
            tracing::warn!(scrimmage_id, match_id, %err, "failed to dispatch ranked match");
            if let Err(db_err) = state.storage.update_failed_match(match_id).await {
                tracing::warn!(match_id, %db_err, "could not mark match failed");
            }
            // the callback will never arrive; release its permit here
            entry.fire(match_id, -1, "").await;
        }
    }

    tracing::info!(scrimmage_id, "waiting for scrimmage matches to finish");
    entry.wait_for(pairings.len()).await;

    let net = net_elo_changes.lock().await;
    let updated_ratings: HashMap<String, i32> = players
        .iter()
        .map(|p| {
            let change = net.get(&p.user.username).copied().unwrap_or(0);
            (p.user.username.clone(), p.rating + change)
        })
        .collect();
    drop(net);

    state.storage.adjust_elo_table(&updated_ratings).await;
    state.scrimmages.remove(scrimmage_id).await;

    tracing::info!(scrimmage_id, ?updated_ratings, "completed scrimmage");
}
