// Public API
pub use cards::{Card, CardError, CardPayload, Deck, Rank, Suit};
pub use dealing::{DealBatch, LotteryResult};
pub use logic::{
    trick_winner, Game, GameError, Phase, PlayOutcome, PlayedCard, RoundResult, TrickResult, SEATS,
};
pub use scoring::{RoundKind, Team, TeamTally};
pub use service::GameService;

// Internal modules
pub mod cards;
pub mod dealing;
pub mod logic;
pub mod scoring;
mod service;
