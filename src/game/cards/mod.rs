pub mod basic;
pub mod deck;

pub use basic::{Card, CardError, CardPayload, Rank, Suit};
pub use deck::{shuffled, standard_deck, Deck};
