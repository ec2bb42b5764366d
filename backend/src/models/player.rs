use crate::db::DbPool;
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    pub team_name: String,
    pub current_rating: i32,
}

impl PlayerRow {
    #[instrument(level = "debug", skip(pool))]
    pub async fn find_by_name(pool: &DbPool, team_name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT team_name, current_rating FROM players WHERE team_name = $1",
        )
        .bind(team_name)
        .fetch_optional(pool)
        .await
    }

    #[instrument(level = "debug", skip(pool))]
    pub async fn set_rating(
        pool: &DbPool,
        team_name: &str,
        current_rating: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE players SET current_rating = $2 WHERE team_name = $1")
            .bind(team_name)
            .bind(current_rating)
            .execute(pool)
            .await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(pool))]
    pub async fn upsert(
        pool: &DbPool,
        team_name: &str,
        current_rating: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO players (team_name, current_rating) VALUES ($1, $2)
             ON CONFLICT (team_name) DO UPDATE SET current_rating = EXCLUDED.current_rating
             RETURNING team_name, current_rating",
        )
        .bind(team_name)
        .bind(current_rating)
        .fetch_one(pool)
        .await
    }
}
