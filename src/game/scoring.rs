use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Team1,
    Team2,
}

impl Team {
    /// Even seat indices sit on team2, odd ones on team1.
    pub fn for_seat(index: usize) -> Team {
        if index % 2 == 0 {
            Team::Team2
        } else {
            Team::Team1
        }
    }

    pub fn other(&self) -> Team {
        match self {
            Team::Team1 => Team::Team2,
            Team::Team2 => Team::Team1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Team1 => write!(f, "team1"),
            Team::Team2 => write!(f, "team2"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamTally {
    pub team1: u32,
    pub team2: u32,
}

impl TeamTally {
    pub fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }

    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Team1 => self.team1,
            Team::Team2 => self.team2,
        }
    }

    pub fn add(&mut self, team: Team, amount: u32) {
        match team {
            Team::Team1 => self.team1 += amount,
            Team::Team2 => self.team2 += amount,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total(&self) -> u32 {
        self.team1 + self.team2
    }

    /// The team whose tally has reached `threshold`, if any.
    pub fn reached(&self, threshold: u32) -> Option<Team> {
        if self.team1 >= threshold {
            Some(Team::Team1)
        } else if self.team2 >= threshold {
            Some(Team::Team2)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Standard,
    /// The trump team won without conceding a trick.
    Kot,
    /// The trump team lost without taking a trick.
    TrumpKot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundScore {
    pub winner: Team,
    pub points: u32,
    pub kind: RoundKind,
}

/// Scores a finished round given the trick tally and which team held trump.
/// Returns `None` while neither team has reached `threshold`.
pub fn score_round(tally: &TeamTally, trump_team: Team, threshold: u32) -> Option<RoundScore> {
    let winner = tally.reached(threshold)?;
    let loser_tricks = tally.get(winner.other());

    let kind = match (loser_tricks, winner == trump_team) {
        (0, true) => RoundKind::Kot,
        (0, false) => RoundKind::TrumpKot,
        _ => RoundKind::Standard,
    };
    let points = match kind {
        RoundKind::Standard => 1,
        RoundKind::Kot => 2,
        RoundKind::TrumpKot => 3,
    };

    Some(RoundScore {
        winner,
        points,
        kind,
    })
}
