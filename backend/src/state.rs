//! Application context.
//!
//! Everything the handlers and orchestrators share lives here and is passed
//! around explicitly as one `Arc`; there are no process-wide mutable
//! statics.

use crate::config::Config;
use crate::counter::MatchIdCounter;
use crate::db::DbPool;
use crate::runner::{RunnerClient, RunnerFile};
use crate::services::game_engine::GameEngine;
use crate::services::registry::{ScrimmageRegistry, TournamentRegistry};
use crate::storage::StorageHandler;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The engine currently used for matches: its descriptor plus the runner
/// handles of the staged artifacts. Replaced as a whole on engine upload,
/// never partially updated.
#[derive(Debug, Clone)]
pub struct ActiveEngine {
    pub descriptor: GameEngine,
    pub engine_file: RunnerFile,
    pub makefile: RunnerFile,
}

pub struct AppState {
    pub config: Config,
    pub pool: DbPool,
    pub runner: RunnerClient,
    pub storage: Arc<StorageHandler>,
    pub engine: RwLock<Option<ActiveEngine>>,
    pub match_counter: MatchIdCounter,
    pub scrimmages: ScrimmageRegistry,
    pub tournaments: TournamentRegistry,
}

pub type SharedState = Arc<AppState>;
