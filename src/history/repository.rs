use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::MatchRecord;
use crate::game::Team;
use crate::shared::AppError;

/// Storage for completed matches
#[async_trait]
pub trait MatchHistoryRepository {
    async fn record_match(&self, record: &MatchRecord) -> Result<(), AppError>;
    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, AppError>;
}

/// In-memory implementation for development and testing. Records are lost on restart.
#[derive(Default)]
pub struct InMemoryMatchHistoryRepository {
    records: RwLock<Vec<MatchRecord>>,
}

impl InMemoryMatchHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl MatchHistoryRepository for InMemoryMatchHistoryRepository {
    #[instrument(skip(self, record), fields(match_id = %record.id))]
    async fn record_match(&self, record: &MatchRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            warn!("Match already recorded in memory");
            return Err(AppError::DatabaseError(
                "Match already recorded".to_string(),
            ));
        }
        records.push(record.clone());
        debug!(room_id = %record.room_id, "Match recorded in memory");
        Ok(())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

/// PostgreSQL implementation of match history
pub struct PostgresMatchHistoryRepository {
    pool: PgPool,
}

impl PostgresMatchHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS match_history (
                id UUID PRIMARY KEY,
                room_id TEXT NOT NULL,
                participants TEXT[] NOT NULL,
                winning_team TEXT NOT NULL,
                team1_score INTEGER NOT NULL,
                team2_score INTEGER NOT NULL,
                rounds_played INTEGER NOT NULL,
                completed_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create match_history table");
            AppError::DatabaseError(e.to_string())
        })?;
        Ok(())
    }
}

fn team_from_column(value: &str) -> Result<Team, AppError> {
    match value {
        "team1" => Ok(Team::Team1),
        "team2" => Ok(Team::Team2),
        other => Err(AppError::DatabaseError(format!(
            "Unknown team in match_history: {}",
            other
        ))),
    }
}

#[async_trait]
impl MatchHistoryRepository for PostgresMatchHistoryRepository {
    #[instrument(skip(self, record), fields(match_id = %record.id))]
    async fn record_match(&self, record: &MatchRecord) -> Result<(), AppError> {
        debug!(room_id = %record.room_id, "Recording match in database");

        sqlx::query(
            "INSERT INTO match_history (id, room_id, participants, winning_team, team1_score, team2_score, rounds_played, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(&record.room_id)
        .bind(&record.participants)
        .bind(record.winning_team.to_string())
        .bind(record.team1_score as i32)
        .bind(record.team2_score as i32)
        .bind(record.rounds_played as i32)
        .bind(record.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_id = %record.room_id, "Failed to record match");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, room_id, participants, winning_team, team1_score, team2_score, rounds_played, completed_at
             FROM match_history ORDER BY completed_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch match history");
            AppError::DatabaseError(e.to_string())
        })?;

        rows.iter()
            .map(|row| {
                let winning_team: String = row.get("winning_team");
                Ok(MatchRecord {
                    id: row.get("id"),
                    room_id: row.get("room_id"),
                    participants: row.get("participants"),
                    winning_team: team_from_column(&winning_team)?,
                    team1_score: row.get::<i32, _>("team1_score") as u32,
                    team2_score: row.get::<i32, _>("team2_score") as u32,
                    rounds_played: row.get::<i32, _>("rounds_played") as u32,
                    completed_at: row.get("completed_at"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TeamTally;

    fn record(room: &str) -> MatchRecord {
        MatchRecord::new(
            room.to_string(),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            Team::Team2,
            TeamTally::new(4, 7),
            9,
        )
    }

    #[tokio::test]
    async fn test_record_and_list_most_recent_first() {
        let repo = InMemoryMatchHistoryRepository::new();
        repo.record_match(&record("first")).await.unwrap();
        repo.record_match(&record("second")).await.unwrap();

        let recent = repo.recent_matches(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].room_id, "second");
        assert_eq!(recent[0].final_score(), TeamTally::new(4, 7));
        assert_eq!(repo.record_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_record_is_rejected() {
        let repo = InMemoryMatchHistoryRepository::new();
        let record = record("room");
        repo.record_match(&record).await.unwrap();
        assert!(matches!(
            repo.record_match(&record).await,
            Err(AppError::DatabaseError(_))
        ));
    }

    #[test]
    fn test_team_column_parsing() {
        assert_eq!(team_from_column("team1").unwrap(), Team::Team1);
        assert!(team_from_column("blue").is_err());
    }
}
