//! Match Runner
//!
//! One instance stages and submits a single match to the external runner:
//!
//! 1. Download each bot submission into a scratch directory
//! 2. Stage the engine, makefile, bots, and a match config on the runner
//! 3. Insert the PENDING match row
//! 4. Submit the job, carrying the callback URL the runner will POST the
//!    output to
//!
//! Failures before step 4 surface to the caller; once the job is accepted,
//! any further failure arrives through the callback.

use crate::db::DbPool;
use crate::error::Result;
use crate::models::{MatchKind, PlayerRow};
use crate::runner::{RunnerClient, RunnerFile};
use crate::state::ActiveEngine;
use crate::storage::StorageHandler;
use serde::Deserialize;

/// A bot binary a team uploaded to object storage.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserSubmission {
    pub username: String,
    pub bucket: String,
    pub object_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub game_engine_name: String,
    pub num_players: usize,
    pub user_submissions: Vec<UserSubmission>,
}

/// A submission paired with the team's rating as of scheduling time.
#[derive(Debug, Clone)]
pub struct MatchPlayer {
    pub user: UserSubmission,
    pub rating: i32,
}

/// Snapshot of everything a batch needs from the active engine, taken when
/// the batch starts. Engine changes mid-batch are not observed.
#[derive(Debug, Clone)]
pub struct MatchContext {
    pub engine_file: RunnerFile,
    pub makefile: RunnerFile,
    pub callback_host: String,
}

impl MatchContext {
    pub fn new(engine: &ActiveEngine, callback_host: &str) -> Self {
        Self {
            engine_file: engine.engine_file.clone(),
            makefile: engine.makefile.clone(),
            callback_host: callback_host.to_string(),
        }
    }
}

pub struct MatchRunner<'a> {
    pub runner: &'a RunnerClient,
    pub storage: &'a StorageHandler,
    pub ctx: &'a MatchContext,
    pub match_id: i64,
    pub kind: MatchKind,
    pub game_map: String,
    pub callback_path: String,
}

impl MatchRunner<'_> {
    pub async fn send_job(&self, request: &MatchRequest) -> Result<serde_json::Value> {
        let scratch = tempfile::tempdir()?;

        let mut files = vec![self.ctx.makefile.clone(), self.ctx.engine_file.clone()];

        for (i, submission) in request.user_submissions.iter().enumerate() {
            let bot_name = format!("team{}.py", i + 1);
            let local_path = scratch.path().join(&bot_name);
            self.storage
                .download_bot(&submission.bucket, &submission.object_key, &local_path)
                .await?;
            files.push(self.upload(&local_path, &bot_name).await?);
        }

        let config = serde_json::json!({
            "map": self.game_map,
            "red_bot": "team1",
            "blue_bot": "team2",
        });
        let config_path = scratch.path().join("config.json");
        tokio::fs::write(&config_path, config.to_string()).await?;
        files.push(self.upload(&config_path, "config.json").await?);

        self.storage
            .insert_pending_match(
                self.match_id,
                &request.user_submissions[0].username,
                &request.user_submissions[1].username,
                self.kind,
                &self.game_map,
            )
            .await?;

        let callback_url = format!(
            "http://{}/{}/{}",
            self.ctx.callback_host, self.callback_path, self.match_id
        );
        self.runner
            .add_job(
                &self.match_id.to_string(),
                &files,
                &format!("output-{}.json", self.match_id),
                &callback_url,
            )
            .await
    }

    /// Stages a scratch file on the runner, prefixing the runner-side name
    /// with the match id so concurrent matches never collide.
    async fn upload(&self, local_path: &std::path::Path, vm_name: &str) -> Result<RunnerFile> {
        let runner_name = format!("{}-{}", self.match_id, vm_name);
        self.runner
            .upload_file(local_path, &runner_name, vm_name)
            .await
    }
}

/// Looks up scheduling-time ratings for a set of submissions. Users without
/// a player row are dropped (with a log line), and the result is sorted by
/// rating, best first.
pub async fn match_players_info(
    pool: &DbPool,
    submissions: &[UserSubmission],
) -> Result<Vec<MatchPlayer>> {
    let mut players = Vec::with_capacity(submissions.len());
    for submission in submissions {
        match PlayerRow::find_by_name(pool, &submission.username).await? {
            Some(row) => players.push(MatchPlayer {
                user: submission.clone(),
                rating: row.current_rating,
            }),
            None => {
                tracing::warn!(username = %submission.username, "rating info could not be found");
            }
        }
    }
    players.sort_by(|a, b| b.rating.cmp(&a.rating));
    Ok(players)
}
