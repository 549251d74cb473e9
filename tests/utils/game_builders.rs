#![allow(dead_code)]

use hokm::game::{Card, Game, Suit, TeamTally};
use hokm::RulesConfig;

use super::setup::TestSetup;

// ============================================================================
// Card Creation Macro
// ============================================================================

#[macro_export]
macro_rules! cards {
    ($($rank:ident $suit:ident),* $(,)?) => {
        vec![$(hokm::game::Card::new(hokm::game::Rank::$rank, hokm::game::Suit::$suit)),*]
    };
}

// ============================================================================
// Game Setup Utilities
// ============================================================================

/// Puts the setup's room straight into trick play with known hands.
pub struct GameBuilder {
    hands: [Vec<Card>; 4],
    trump: Suit,
    chooser: usize,
    round_tally: TeamTally,
    rules: RulesConfig,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            hands: Default::default(),
            trump: Suit::Spades,
            chooser: 0,
            round_tally: TeamTally::default(),
            rules: RulesConfig::default(),
        }
    }

    pub fn with_hand(mut self, seat: usize, cards: Vec<Card>) -> Self {
        self.hands[seat] = cards;
        self
    }

    pub fn with_trump(mut self, trump: Suit) -> Self {
        self.trump = trump;
        self
    }

    pub fn with_chooser(mut self, seat: usize) -> Self {
        self.chooser = seat;
        self
    }

    pub fn with_round_tally(mut self, team1: u32, team2: u32) -> Self {
        self.round_tally = TeamTally::new(team1, team2);
        self
    }

    /// Two cards per seat in that seat's own suit, hearts for seat 0.
    pub fn with_simple_hands(self) -> Self {
        self.with_hand(0, cards![Two Hearts, Three Hearts])
            .with_hand(1, cards![Two Diamonds, Three Diamonds])
            .with_hand(2, cards![Two Clubs, Three Clubs])
            .with_hand(3, cards![Two Spades, Three Spades])
    }

    pub async fn build_with_setup(self, setup: &TestSetup) {
        let game = Game::in_play(self.rules, self.hands, self.trump, self.chooser)
            .with_round_tally(self.round_tally);
        let handle = setup.room().await;
        handle.lock().await.game = game;
        setup.clear_messages().await;
    }
}
