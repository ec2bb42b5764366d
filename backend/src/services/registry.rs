//! Ongoing-batch Registries
//!
//! Runner callbacks arrive on HTTP handler tasks while the batch
//! orchestrators block on their own workers. These tables are the meeting
//! point: a batch registers what it is waiting for, the callback handler
//! fires the matching entry, and semaphore permits carry the completion
//! signal across tasks.
//!
//! A ranked batch waits once for all of its matches; a tournament pairing
//! waits once per map in its series, so each series slot owns its own
//! semaphore.

use crate::services::elo;
use crate::services::match_runner::MatchPlayer;
use crate::storage::{DEFAULT_REPLAY_TTL, StorageHandler};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

// ---------------------------------------------------------------------------
// Ranked scrimmages
// ---------------------------------------------------------------------------

/// Work done when one ranked match finishes: fold the rating deltas into the
/// batch's shared accumulator and record the finished row.
pub struct RankedCallback {
    pub player_1: MatchPlayer,
    pub player_2: MatchPlayer,
    pub match_id: i64,
    pub net_elo_changes: Arc<Mutex<HashMap<String, i32>>>,
    pub storage: Arc<StorageHandler>,
}

impl RankedCallback {
    pub async fn invoke(&self, winner: i32, replay_filename: &str) {
        let first_player_won = winner == 1;
        let (change_1, change_2) = elo::rating_changes(
            self.player_1.rating,
            self.player_2.rating,
            first_player_won,
        );

        {
            let mut net = self.net_elo_changes.lock().await;
            *net.entry(self.player_1.user.username.clone()).or_insert(0) += change_1;
            *net.entry(self.player_2.user.username.clone()).or_insert(0) += change_2;
        }

        let replay_url = if replay_filename.is_empty() {
            String::new()
        } else {
            match self
                .storage
                .replay_url(replay_filename, DEFAULT_REPLAY_TTL)
                .await
            {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(match_id = self.match_id, %err, "could not presign replay");
                    String::new()
                }
            }
        };

        if let Err(err) = self
            .storage
            .update_finished_match(
                self.match_id,
                &format!("team{winner}"),
                replay_filename,
                &replay_url,
                change_1.abs(),
            )
            .await
        {
            tracing::warn!(match_id = self.match_id, %err, "could not record finished match");
        }
    }
}

/// Per-batch table for a ranked scrimmage. The orchestrator registers one
/// callback per match before submitting it, then acquires one permit per
/// match; every fired callback releases exactly one permit, win or fail.
pub struct ScrimmageEntry {
    semaphore: Semaphore,
    callbacks: Mutex<HashMap<i64, RankedCallback>>,
}

impl ScrimmageEntry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            semaphore: Semaphore::new(0),
            callbacks: Mutex::new(HashMap::new()),
        })
    }

    pub async fn register(&self, match_id: i64, callback: RankedCallback) {
        self.callbacks.lock().await.insert(match_id, callback);
    }

    /// Routes one finished match. A non-positive winner marks a failed match:
    /// no rating movement, but the batch still advances.
    pub async fn fire(&self, match_id: i64, winner: i32, replay_filename: &str) {
        let callback = self.callbacks.lock().await.remove(&match_id);
        match callback {
            Some(callback) if winner > 0 => callback.invoke(winner, replay_filename).await,
            Some(_) => {}
            None => {
                tracing::warn!(match_id, "callback for unknown ranked match");
            }
        }
        self.semaphore.add_permits(1);
    }

    /// Blocks until `count` matches have fired.
    pub async fn wait_for(&self, count: usize) {
        if let Ok(permit) = self.semaphore.acquire_many(count as u32).await {
            permit.forget();
        }
    }
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOutcome {
    pub winner: i32,
    pub replay_filename: String,
}

/// One awaited match inside a tournament series. The callback deposits the
/// outcome and releases the permit; the series task is blocked on `wait` and
/// dispatches the next map only after that, which keeps a series strictly
/// sequential.
pub struct SeriesSlot {
    ready: Semaphore,
    outcome: Mutex<Option<MapOutcome>>,
}

impl SeriesSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: Semaphore::new(0),
            outcome: Mutex::new(None),
        })
    }

    pub async fn complete(&self, winner: i32, replay_filename: &str) {
        *self.outcome.lock().await = Some(MapOutcome {
            winner,
            replay_filename: replay_filename.to_string(),
        });
        self.ready.add_permits(1);
    }

    pub async fn wait(&self) -> MapOutcome {
        if let Ok(permit) = self.ready.acquire().await {
            permit.forget();
        }
        self.outcome.lock().await.take().unwrap_or(MapOutcome {
            winner: -1,
            replay_filename: String::new(),
        })
    }
}

/// Per-batch table for a tournament: match id to the series slot waiting on
/// it. Every access goes through the mutex.
pub struct TournamentEntry {
    slots: Mutex<HashMap<i64, Arc<SeriesSlot>>>,
}

impl TournamentEntry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(HashMap::new()),
        })
    }

    pub async fn register(&self, match_id: i64, slot: Arc<SeriesSlot>) {
        self.slots.lock().await.insert(match_id, slot);
    }

    pub async fn fire(&self, match_id: i64, winner: i32, replay_filename: &str) {
        let slot = self.slots.lock().await.remove(&match_id);
        match slot {
            Some(slot) => slot.complete(winner, replay_filename).await,
            None => {
                tracing::warn!(match_id, "callback for unknown tournament match");
            }
        }
    }

    /// Drops a registration that will never fire (the job was never
    /// accepted).
    pub async fn take(&self, match_id: i64) {
        self.slots.lock().await.remove(&match_id);
    }

    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

// ---------------------------------------------------------------------------
// Global registries, keyed by batch id
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ScrimmageRegistry {
    entries: Mutex<HashMap<i64, Arc<ScrimmageEntry>>>,
}

impl ScrimmageRegistry {
    pub async fn insert(&self, scrimmage_id: i64) -> Arc<ScrimmageEntry> {
        let entry = ScrimmageEntry::new();
        self.entries
            .lock()
            .await
            .insert(scrimmage_id, entry.clone());
        entry
    }

    pub async fn get(&self, scrimmage_id: i64) -> Option<Arc<ScrimmageEntry>> {
        self.entries.lock().await.get(&scrimmage_id).cloned()
    }

    pub async fn remove(&self, scrimmage_id: i64) {
        self.entries.lock().await.remove(&scrimmage_id);
    }
}

#[derive(Default)]
pub struct TournamentRegistry {
    entries: Mutex<HashMap<i64, Arc<TournamentEntry>>>,
}

impl TournamentRegistry {
    pub async fn insert(&self, tournament_id: i64) -> Arc<TournamentEntry> {
        let entry = TournamentEntry::new();
        self.entries
            .lock()
            .await
            .insert(tournament_id, entry.clone());
        entry
    }

    pub async fn get(&self, tournament_id: i64) -> Option<Arc<TournamentEntry>> {
        self.entries.lock().await.get(&tournament_id).cloned()
    }

    pub async fn remove(&self, tournament_id: i64) {
        self.entries.lock().await.remove(&tournament_id);
    }
}
