use rand::seq::SliceRandom;

use super::basic::Card;

/// The standard 52-card deck in suit-major order.
pub fn standard_deck() -> Vec<Card> {
    Card::all_cards()
}

/// A randomly permuted copy of `cards`.
pub fn shuffled(cards: &[Card]) -> Vec<Card> {
    let mut copy = cards.to_vec();
    copy.shuffle(&mut rand::rng());
    copy
}

/// Remaining cards of a deal, drawn from the front.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn shuffled() -> Self {
        Self::from_cards(shuffled(&standard_deck()))
    }

    /// Deck with a fixed order, first element drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn draw(&mut self) -> Option<Card> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    /// Draws `count` cards, or nothing at all if fewer remain.
    pub fn draw_many(&mut self, count: usize) -> Option<Vec<Card>> {
        if self.cards.len() < count {
            return None;
        }
        Some(self.cards.drain(..count).collect())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
