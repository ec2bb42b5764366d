use crate::db::DbPool;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::Type;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Type, PartialEq, Eq)]
#[sqlx(type_name = "match_kind", rename_all = "lowercase")]
pub enum MatchKind {
    Unranked,
    Ranked,
    Tournament,
}

#[derive(Debug, Clone, Copy, Type, PartialEq, Eq)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Finished,
    Failed,
}

/// One row of the matches table. A row is created PENDING when the job is
/// submitted and moves to exactly one terminal status afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct MatchRecord {
    pub match_id: i64,
    pub team_1: String,
    pub team_2: String,
    pub match_type: MatchKind,
    pub match_status: MatchStatus,
    pub outcome: String,
    pub replay_filename: String,
    pub replay_url: String,
    pub elo_change: i32,
    pub map_name: String,
    pub last_updated: DateTime<Utc>,
}

const COLUMNS: &str = "match_id, team_1, team_2, match_type, match_status, outcome, \
                       replay_filename, replay_url, elo_change, map_name, last_updated";

impl MatchRecord {
    #[instrument(level = "debug", skip(pool))]
    pub async fn find_by_id(pool: &DbPool, match_id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM matches WHERE match_id = $1"
        ))
        .bind(match_id)
        .fetch_optional(pool)
        .await
    }

    #[instrument(level = "debug", skip(pool))]
    pub async fn insert_pending(
        pool: &DbPool,
        match_id: i64,
        team_1: &str,
        team_2: &str,
        match_type: MatchKind,
        map_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO matches (match_id, team_1, team_2, match_type, match_status, map_name, last_updated)
             VALUES ($1, $2, $3, $4, 'pending', $5, now())",
        )
        .bind(match_id)
        .bind(team_1)
        .bind(team_2)
        .bind(match_type)
        .bind(map_name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Idempotent: repeating the call with the same arguments leaves the row
    /// in the same state.
    #[instrument(level = "debug", skip(pool))]
    pub async fn mark_finished(
        pool: &DbPool,
        match_id: i64,
        outcome: &str,
        replay_filename: &str,
        replay_url: &str,
        elo_change: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE matches
             SET match_status = 'finished', outcome = $2, replay_filename = $3,
                 replay_url = $4, elo_change = $5, last_updated = now()
             WHERE match_id = $1",
        )
        .bind(match_id)
        .bind(outcome)
        .bind(replay_filename)
        .bind(replay_url)
        .bind(elo_change)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Marks the row FAILED; all other fields keep their submit-time values.
    #[instrument(level = "debug", skip(pool))]
    pub async fn mark_failed(pool: &DbPool, match_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE matches SET match_status = 'failed', last_updated = now() WHERE match_id = $1",
        )
        .bind(match_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Seed for the match-id counter: one past the highest id ever written,
    /// or 1 on an empty table.
    #[instrument(level = "debug", skip(pool))]
    pub async fn next_match_id(pool: &DbPool) -> Result<i64, sqlx::Error> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(match_id) FROM matches")
            .fetch_one(pool)
            .await?;
        Ok(max.unwrap_or(0) + 1)
    }
}
