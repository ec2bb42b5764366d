use crate::error::Result;
use crate::services::game_engine::{
    GameEngine, PersistedEngine, download_engine, persist_engine, reload_engine,
    validate_map_selection,
};
use crate::state::{ActiveEngine, SharedState};
use axum::Json;
use axum::extract::State;
use std::path::{Path, PathBuf};

/// Sets the game engine used for all subsequent matches. Downloads the
/// engine and makefile artifacts, stages them on the runner, and swaps the
/// active engine in one step.
pub async fn set_game_engine(
    State(state): State<SharedState>,
    Json(new_engine): Json<GameEngine>,
) -> Result<Json<serde_json::Value>> {
    validate_map_selection(&new_engine.map_choice)?;

    let data_dir = Path::new(&state.config.temp_dir);
    let (engine_path, makefile_path) =
        download_engine(state.runner.http(), &new_engine, data_dir).await?;

    install_engine(&state, new_engine, engine_path, makefile_path).await
}

/// Re-establishes the engine recorded in the persisted descriptor, staging
/// the already-downloaded artifacts on the runner again.
pub async fn reload_game_engine(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>> {
    let persisted = reload_engine(Path::new(&state.config.temp_dir))?;
    validate_map_selection(&persisted.engine_details.map_choice)?;

    install_engine(
        &state,
        persisted.engine_details,
        persisted.engine_path,
        persisted.makefile_path,
    )
    .await
}

async fn install_engine(
    state: &SharedState,
    engine: GameEngine,
    engine_path: PathBuf,
    makefile_path: PathBuf,
) -> Result<Json<serde_json::Value>> {
    let engine_file = state
        .runner
        .upload_file(&engine_path, &engine.engine_filename, &engine.engine_filename)
        .await?;
    let makefile = state
        .runner
        .upload_file(&makefile_path, &engine.makefile_filename, "Makefile")
        .await?;

    persist_engine(
        Path::new(&state.config.temp_dir),
        &PersistedEngine {
            engine_path,
            makefile_path,
            engine_details: engine.clone(),
        },
    )?;

    let name = engine.game_engine_name.clone();
    *state.engine.write().await = Some(ActiveEngine {
        descriptor: engine,
        engine_file,
        makefile,
    });

    tracing::info!(engine = %name, "active game engine replaced");
    Ok(Json(serde_json::json!({
        "status": format!("Game engine set to {name}")
    })))
}
