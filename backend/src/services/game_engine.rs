//! Game Engine Registry
//!
//! The service runs matches for exactly one game engine at a time. Setting a
//! new engine downloads its artifacts, stages them on the runner, and swaps
//! the active engine in one step; a persisted descriptor lets the engine be
//! re-established after a restart without re-downloading.

use crate::error::{AppError, Result};
use crate::models::MatchKind;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Map pools per match kind. Tournament rounds each play a fixed ordered
/// list; the list length is the series length for that round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSelection {
    pub unranked_possible_maps: Vec<String>,
    pub ranked_possible_maps: Vec<String>,
    pub tourney_map_order: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEngine {
    pub game_engine_name: String,
    pub engine_filename: String,
    pub engine_download_url: String,
    pub makefile_filename: String,
    pub makefile_download_url: String,
    pub num_players: usize,
    pub map_choice: MapSelection,
}

/// On-disk record of the active engine, written next to the downloaded
/// artifacts so `game_engine_reload` can rebind without the original URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEngine {
    pub engine_path: PathBuf,
    pub makefile_path: PathBuf,
    pub engine_details: GameEngine,
}

const PERSIST_FILENAME: &str = "engine-persistent.json";

/// A tournament series must always produce a majority winner, so every
/// round's map list has to be odd; the unranked and ranked pools just need a
/// map to pick.
pub fn validate_map_selection(maps: &MapSelection) -> Result<()> {
    if maps.unranked_possible_maps.is_empty() || maps.ranked_possible_maps.is_empty() {
        return Err(AppError::Validation(
            "unranked and ranked map pools must not be empty".to_string(),
        ));
    }
    if maps.tourney_map_order.is_empty() {
        return Err(AppError::Validation(
            "tournament map order must contain at least one round".to_string(),
        ));
    }
    for layer in &maps.tourney_map_order {
        if layer.len() % 2 != 1 {
            return Err(AppError::Validation(format!(
                "tournament round {layer:?} does not have an odd number of maps"
            )));
        }
    }
    Ok(())
}

/// Picks a map for an unranked or ranked match. Tournament maps are fixed
/// per round and never chosen at random.
pub fn choose_map(maps: &MapSelection, kind: MatchKind) -> Result<String> {
    let pool = match kind {
        MatchKind::Unranked => &maps.unranked_possible_maps,
        MatchKind::Ranked => &maps.ranked_possible_maps,
        MatchKind::Tournament => {
            return Err(AppError::Internal(
                "tournament maps come from the round order, not random choice".to_string(),
            ));
        }
    };
    pool.choose(&mut rand::rng())
        .cloned()
        .ok_or_else(|| AppError::Validation("no maps configured".to_string()))
}

/// Downloads the engine and makefile artifacts into `data_dir`.
///
/// A download failure is the caller's problem (bad URL), not ours.
pub async fn download_engine(
    http: &reqwest::Client,
    engine: &GameEngine,
    data_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let engine_path = data_dir.join(&engine.engine_filename);
    fetch_artifact(http, &engine.engine_download_url, &engine_path).await?;

    let makefile_path = data_dir.join(&engine.makefile_filename);
    fetch_artifact(http, &engine.makefile_download_url, &makefile_path).await?;

    Ok((engine_path, makefile_path))
}

async fn fetch_artifact(http: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Validation(format!("Could not download game engine: {e}")))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Could not download game engine: {e}")))?;
    tokio::fs::write(dest, body).await?;
    Ok(())
}

pub fn persist_engine(data_dir: &Path, persisted: &PersistedEngine) -> Result<()> {
    let body = serde_json::to_vec_pretty(persisted)
        .map_err(|e| AppError::Internal(format!("engine descriptor encoding: {e}")))?;
    std::fs::write(data_dir.join(PERSIST_FILENAME), body)?;
    Ok(())
}

pub fn reload_engine(data_dir: &Path) -> Result<PersistedEngine> {
    let body = std::fs::read(data_dir.join(PERSIST_FILENAME))?;
    serde_json::from_slice(&body)
        .map_err(|e| AppError::Internal(format!("persisted engine is unreadable: {e}")))
}
