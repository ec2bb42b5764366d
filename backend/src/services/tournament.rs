//! Tournament Orchestrator
//!
//! Single-elimination bracket over the top-rated submissions. Seeding pads
//! the field to a power of two with byes and interleaves seeds so the best
//! players can only meet late. Every pairing plays a best-of-N series on the
//! round's fixed map list (N odd, so a series cannot draw); pairings run
//! concurrently under a bounded pool while the maps inside one series run
//! strictly one after another.
//!
//! The finished bracket is uploaded as a JSON document, one entry per round.

use crate::models::MatchKind;
use crate::services::match_runner::{MatchContext, MatchPlayer, MatchRequest, MatchRunner};
use crate::services::registry::{MapOutcome, SeriesSlot, TournamentEntry};
use crate::state::SharedState;
use crate::storage::DEFAULT_REPLAY_TTL;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Pairings played at the same time within one round.
const MAX_PARALLEL_PAIRINGS: usize = 16;

pub const BYE: &str = "bye";

#[derive(Debug, Clone, Deserialize)]
pub struct TournamentRequest {
    pub user_submissions: Vec<crate::services::match_runner::UserSubmission>,
    pub game_engine_name: String,
    pub num_tournament_spots: usize,
}

/// One pairing of the persisted bracket document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BracketPairing {
    pub player1: String,
    pub player2: String,
    pub overall_winner: String,
    /// Presigned replay link per map, `""` for a forfeit, `"failed"` for a
    /// map that produced no result.
    pub replay_urls: Vec<String>,
    /// Winning side per map (1 or 2), `-1` for a failed map.
    pub map_winners: Vec<i32>,
}

pub type BracketRound = Vec<BracketPairing>;
pub type BracketDocument = Vec<BracketRound>;

/// Standard bracket interleave: first seed against last, second against
/// second-to-last. Applied to the seeded field and again to each round's
/// winners so the bracket structure carries through. Expects an even number
/// of items.
pub fn interleave<T>(items: Vec<T>) -> Vec<T> {
    let mut front = Vec::with_capacity(items.len());
    let mut back = Vec::new();
    let half = items.len() / 2;
    for (i, item) in items.into_iter().enumerate() {
        if i < half {
            front.push(item);
        } else {
            back.push(item);
        }
    }
    let mut out = Vec::with_capacity(front.len() + back.len());
    for (a, b) in front.into_iter().zip(back.into_iter().rev()) {
        out.push(a);
        out.push(b);
    }
    out
}

/// Pads the seeded field with byes up to the next power of two.
pub fn pad_to_power_of_two(mut players: Vec<Option<MatchPlayer>>) -> Vec<Option<MatchPlayer>> {
    while !players.len().is_power_of_two() {
        players.push(None);
    }
    players
}

/// Series decision: whoever took more maps; equal win counts go to the
/// better seed.
pub fn series_winner(p1_wins: usize, p2_wins: usize) -> i32 {
    if p1_wins >= p2_wins { 1 } else { 2 }
}

#[derive(Clone)]
struct TournamentShared {
    state: SharedState,
    entry: Arc<TournamentEntry>,
    ctx: MatchContext,
    engine_name: String,
    tournament_id: i64,
}

/// Batch worker. Runs on its own task; the submitting handler has already
/// returned the tournament id to the caller.
pub async fn run_tournament(
    state: SharedState,
    tournament_id: i64,
    entry: Arc<TournamentEntry>,
    request: TournamentRequest,
    mut players: Vec<MatchPlayer>,
    ctx: MatchContext,
    map_order: Vec<Vec<String>>,
) {
    players.truncate(request.num_tournament_spots);
    tracing::info!(
        tournament_id,
        players = players.len(),
        "running tournament"
    );

    let shared = TournamentShared {
        state: state.clone(),
        entry: entry.clone(),
        ctx,
        engine_name: request.game_engine_name.clone(),
        tournament_id,
    };

    let bracket = match players.len() {
        0 => BracketDocument::new(),
        1 => vec![vec![bye_pairing(&players[0])]],
        _ => {
            let seeded = interleave(pad_to_power_of_two(players.into_iter().map(Some).collect()));
            play_bracket(&shared, seeded, &map_order).await
        }
    };

    if let Some(decider) = bracket.last().and_then(|round| round.first()) {
        tracing::info!(tournament_id, winner = %decider.overall_winner, "tournament complete");
    }

    if let Err(err) = state.storage.upload_bracket(tournament_id, &bracket).await {
        tracing::error!(tournament_id, %err, "could not upload bracket document");
    }

    entry.clear().await;
    state.tournaments.remove(tournament_id).await;
}

async fn play_bracket(
    shared: &TournamentShared,
    mut layer: Vec<Option<MatchPlayer>>,
    map_order: &[Vec<String>],
) -> BracketDocument {
    let limiter = Arc::new(Semaphore::new(MAX_PARALLEL_PAIRINGS));
    let mut bracket = BracketDocument::new();
    let mut layer_index = 0usize;

    while layer.len() > 1 {
        let maps = &map_order[layer_index % map_order.len()];

        let pairings: Vec<(Option<MatchPlayer>, Option<MatchPlayer>)> = {
            let mut it = layer.into_iter();
            let mut pairs = Vec::new();
            while let (Some(a), Some(b)) = (it.next(), it.next()) {
                pairs.push((a, b));
            }
            pairs
        };

        let results = futures::future::join_all(pairings.into_iter().map(|(a, b)| {
            run_pairing(shared.clone(), a, b, maps.clone(), limiter.clone())
        }))
        .await;
        let results: Vec<(BracketPairing, MatchPlayer)> =
            results.into_iter().flatten().collect();

        let (round, winners): (BracketRound, Vec<MatchPlayer>) = results.into_iter().unzip();
        bracket.push(round);

        let winners: Vec<Option<MatchPlayer>> = winners.into_iter().map(Some).collect();
        layer = if winners.len() > 1 {
            interleave(winners)
        } else {
            winners
        };
        layer_index += 1;
    }

    bracket
}

fn bye_pairing(player: &MatchPlayer) -> BracketPairing {
    BracketPairing {
        player1: player.user.username.clone(),
        player2: BYE.to_string(),
        overall_winner: player.user.username.clone(),
        replay_urls: Vec::new(),
        map_winners: Vec::new(),
    }
}

/// Plays one pairing to completion and returns its bracket entry plus the
/// advancing player. Byes advance without using a pool slot.
async fn run_pairing(
    shared: TournamentShared,
    side_1: Option<MatchPlayer>,
    side_2: Option<MatchPlayer>,
    maps: Vec<String>,
    limiter: Arc<Semaphore>,
) -> Option<(BracketPairing, MatchPlayer)> {
    match (side_1, side_2) {
        (Some(player), None) | (None, Some(player)) => {
            Some((bye_pairing(&player), player))
        }
        (Some(player_1), Some(player_2)) => {
            let _permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            Some(run_series(&shared, player_1, player_2, &maps).await)
        }
        (None, None) => None,
    }
}

/// Best-of-N series on the round's map list. Maps are dispatched one at a
/// time; the series stops as soon as one side has a majority.
async fn run_series(
    shared: &TournamentShared,
    player_1: MatchPlayer,
    player_2: MatchPlayer,
    maps: &[String],
) -> (BracketPairing, MatchPlayer) {
    let required_wins = maps.len() / 2 + 1;
    let mut p1_wins = 0usize;
    let mut p2_wins = 0usize;
    let mut replay_urls = Vec::new();
    let mut map_winners = Vec::new();

    for game_map in maps {
        if p1_wins >= required_wins || p2_wins >= required_wins {
            break;
        }

        let outcome = play_map(shared, &player_1, &player_2, game_map).await;
        match outcome.winner {
            1 => p1_wins += 1,
            2 => p2_wins += 1,
            _ => {}
        }

        if outcome.winner > 0 {
            replay_urls.push(outcome.replay_url);
            map_winners.push(outcome.winner);
        } else {
            replay_urls.push("failed".to_string());
            map_winners.push(-1);
        }
    }

    let winner = if series_winner(p1_wins, p2_wins) == 1 {
        player_1.clone()
    } else {
        player_2.clone()
    };
    tracing::info!(
        tournament_id = shared.tournament_id,
        player_1 = %player_1.user.username,
        player_2 = %player_2.user.username,
        p1_wins,
        p2_wins,
        winner = %winner.user.username,
        "series finished"
    );

    (
        BracketPairing {
            player1: player_1.user.username.clone(),
            player2: player_2.user.username.clone(),
            overall_winner: winner.user.username.clone(),
            replay_urls,
            map_winners,
        },
        winner,
    )
}

struct PlayedMap {
    winner: i32,
    replay_url: String,
}

/// Submits one map of a series and blocks until its callback fires (or the
/// submission itself fails). Records the terminal row for the match.
async fn play_map(
    shared: &TournamentShared,
    player_1: &MatchPlayer,
    player_2: &MatchPlayer,
    game_map: &str,
) -> PlayedMap {
    let match_id = shared.state.match_counter.next();
    let slot = SeriesSlot::new();
    shared.entry.register(match_id, slot.clone()).await;

    let match_request = MatchRequest {
        game_engine_name: shared.engine_name.clone(),
        num_players: 2,
        user_submissions: vec![player_1.user.clone(), player_2.user.clone()],
    };
    let runner = MatchRunner {
        runner: &shared.state.runner,
        storage: &shared.state.storage,
        ctx: &shared.ctx,
        match_id,
        kind: MatchKind::Tournament,
        game_map: game_map.to_string(),
        callback_path: format!("tournament_callback/{}", shared.tournament_id),
    };

    let outcome = match runner.send_job(&match_request).await {
        Ok(_) => slot.wait().await,
        Err(err) => {
            tracing::warn!(match_id, %err, "failed to dispatch tournament match");
            shared.entry.take(match_id).await;
            if let Err(db_err) = shared.state.storage.update_failed_match(match_id).await {
                tracing::warn!(match_id, %db_err, "could not mark match failed");
            }
            MapOutcome {
                winner: -1,
                replay_filename: String::new(),
            }
        }
    };

    if outcome.winner <= 0 {
        return PlayedMap {
            winner: outcome.winner,
            replay_url: String::new(),
        };
    }

    let replay_url = if outcome.replay_filename.is_empty() {
        String::new()
    } else {
        match shared
            .state
            .storage
            .replay_url(&outcome.replay_filename, DEFAULT_REPLAY_TTL)
            .await
        {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(match_id, %err, "could not presign replay");
                String::new()
            }
        }
    };

    if let Err(err) = shared
        .state
        .storage
        .update_finished_match(
            match_id,
            &format!("team{}", outcome.winner),
            &outcome.replay_filename,
            &replay_url,
            0,
        )
        .await
    {
        tracing::warn!(match_id, %err, "could not record finished match");
    }

    PlayedMap {
        winner: outcome.winner,
        replay_url,
    }
}
