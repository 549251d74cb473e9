use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::game::{Team, TeamTally};

/// A completed match as handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: Uuid,
    pub room_id: String,
    /// Seat ids in seat-index order.
    pub participants: Vec<String>,
    pub winning_team: Team,
    pub team1_score: u32,
    pub team2_score: u32,
    pub rounds_played: u32,
    pub completed_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn new(
        room_id: String,
        participants: Vec<String>,
        winning_team: Team,
        final_score: TeamTally,
        rounds_played: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            participants,
            winning_team,
            team1_score: final_score.team1,
            team2_score: final_score.team2,
            rounds_played,
            completed_at: Utc::now(),
        }
    }

    pub fn final_score(&self) -> TeamTally {
        TeamTally::new(self.team1_score, self.team2_score)
    }
}
