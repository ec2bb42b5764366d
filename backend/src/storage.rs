//! Object-storage and match/player table operations.
//!
//! Replays, bracket documents, and raw error logs each live in their own
//! bucket; bot submissions are downloaded from whatever bucket the submitting
//! team uploaded to. Row operations delegate to the models and are
//! best-effort where a batch's correctness does not depend on them.

use crate::config::{Config, S3Config};
use crate::db::DbPool;
use crate::error::Result;
use crate::models::{MatchKind, MatchRecord, PlayerRow};
use crate::replay::{RunnerOutput, scan_output, winner_from_replay};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Default lifetime of presigned replay links.
pub const DEFAULT_REPLAY_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Outcome of a processed runner callback. A forfeit leaves
/// `replay_filename` empty: no replay object exists for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedReplay {
    pub winner: i32,
    pub replay_filename: String,
}

/// Build an `object_store::aws::AmazonS3` instance for the given bucket.
fn build_store(config: &S3Config, bucket: &str) -> Result<AmazonS3> {
    let mut builder = AmazonS3Builder::new()
        .with_region(config.region.clone())
        .with_bucket_name(bucket)
        .with_access_key_id(config.access_key_id.clone())
        .with_secret_access_key(config.secret_access_key.clone());

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint.clone()).with_allow_http(true);
    }

    Ok(builder.build()?)
}

pub struct StorageHandler {
    pool: DbPool,
    s3: S3Config,
    replays: AmazonS3,
    brackets: AmazonS3,
    error_logs: AmazonS3,
}

impl StorageHandler {
    pub fn new(config: &Config, pool: DbPool) -> Result<Self> {
        Ok(Self {
            pool,
            s3: config.s3.clone(),
            replays: build_store(&config.s3, &config.replay_bucket)?,
            brackets: build_store(&config.s3, &config.bracket_bucket)?,
            error_logs: build_store(&config.s3, &config.error_log_bucket)?,
        })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Resolves a runner callback body to a winner.
    ///
    /// A normal replay is uploaded to the replay bucket under
    /// `dest_filename`. A broken-bot forfeit stores the raw output in the
    /// error-log bucket for forensics and reports the surviving side as the
    /// winner. Anything without a sentinel is a parse error.
    pub async fn process_replay(&self, raw: &[u8], dest_filename: &str) -> Result<ProcessedReplay> {
        match scan_output(raw)? {
            RunnerOutput::Replay { replay_line } => {
                let winner = winner_from_replay(&replay_line)?;
                self.replays
                    .put(
                        &ObjectPath::from(dest_filename),
                        PutPayload::from(replay_line.into_bytes()),
                    )
                    .await?;
                Ok(ProcessedReplay {
                    winner,
                    replay_filename: dest_filename.to_string(),
                })
            }
            RunnerOutput::Forfeit { winner } => {
                tracing::warn!(dest_filename, winner, "match won by default");
                self.store_error_log(raw, dest_filename).await?;
                Ok(ProcessedReplay {
                    winner,
                    replay_filename: String::new(),
                })
            }
        }
    }

    /// Keeps the raw runner output for inspection. Best-effort callers may
    /// ignore the result.
    pub async fn store_error_log(&self, raw: &[u8], name: &str) -> Result<()> {
        self.error_logs
            .put(&ObjectPath::from(name), PutPayload::from(raw.to_vec()))
            .await?;
        Ok(())
    }

    /// Presigned GET for a stored replay.
    pub async fn replay_url(&self, name: &str, ttl: Duration) -> Result<String> {
        let url = self
            .replays
            .signed_url(Method::GET, &ObjectPath::from(name), ttl)
            .await?;
        Ok(url.to_string())
    }

    pub async fn upload_bracket<T: serde::Serialize>(
        &self,
        tournament_id: i64,
        bracket: &T,
    ) -> Result<()> {
        let body = serde_json::to_vec(bracket)
            .map_err(|e| crate::error::AppError::Internal(format!("bracket encoding: {e}")))?;
        self.brackets
            .put(
                &ObjectPath::from(format!("tournament_bracket-{tournament_id}.json")),
                PutPayload::from(body),
            )
            .await?;
        Ok(())
    }

    /// Downloads a bot submission from its own bucket into a local scratch
    /// path.
    pub async fn download_bot(
        &self,
        bucket: &str,
        object_key: &str,
        local_path: &Path,
    ) -> Result<()> {
        let store = build_store(&self.s3, bucket)?;
        let body = store.get(&ObjectPath::from(object_key)).await?.bytes().await?;
        tokio::fs::write(local_path, body).await?;
        Ok(())
    }

    pub async fn insert_pending_match(
        &self,
        match_id: i64,
        team_1: &str,
        team_2: &str,
        match_type: MatchKind,
        map_name: &str,
    ) -> Result<()> {
        MatchRecord::insert_pending(&self.pool, match_id, team_1, team_2, match_type, map_name)
            .await?;
        Ok(())
    }

    pub async fn update_finished_match(
        &self,
        match_id: i64,
        outcome: &str,
        replay_filename: &str,
        replay_url: &str,
        elo_change: i32,
    ) -> Result<()> {
        MatchRecord::mark_finished(
            &self.pool,
            match_id,
            outcome,
            replay_filename,
            replay_url,
            elo_change,
        )
        .await?;
        Ok(())
    }

    pub async fn update_failed_match(&self, match_id: i64) -> Result<()> {
        MatchRecord::mark_failed(&self.pool, match_id).await?;
        Ok(())
    }

    /// Applies the post-scrimmage ratings. A single failed row is logged and
    /// skipped; the rest of the batch still goes through.
    pub async fn adjust_elo_table(&self, new_ratings: &HashMap<String, i32>) {
        for (team_name, rating) in new_ratings {
            if let Err(err) = PlayerRow::set_rating(&self.pool, team_name, *rating).await {
                tracing::warn!(team_name, rating, %err, "failed to write new rating");
            }
        }
    }

    pub async fn next_match_id(&self) -> Result<i64> {
        Ok(MatchRecord::next_match_id(&self.pool).await?)
    }
}
