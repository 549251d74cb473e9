use super::cards::{Card, Deck, Rank};
use super::logic::{GameError, SEATS};

/// Cards the trump chooser holds while picking trump.
pub const CHOOSER_HAND_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryDraw {
    pub seat: usize,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryResult {
    pub draws: Vec<LotteryDraw>,
    pub chooser: usize,
}

/// Deals single cards round-robin from seat 0 until an Ace comes up.
/// The seat that receives the Ace becomes the trump chooser.
pub fn run_ace_lottery(deck: &mut Deck) -> Result<LotteryResult, GameError> {
    let mut draws = Vec::new();
    let mut seat = 0;

    loop {
        let card = deck.draw().ok_or(GameError::DeckExhausted)?;
        draws.push(LotteryDraw { seat, card });
        if card.rank == Rank::Ace {
            return Ok(LotteryResult {
                draws,
                chooser: seat,
            });
        }
        seat = (seat + 1) % SEATS;
    }
}

/// The three paced batches dealt once trump is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealBatch {
    First,
    Second,
    Third,
}

impl DealBatch {
    pub const ALL: [DealBatch; 3] = [DealBatch::First, DealBatch::Second, DealBatch::Third];

    pub fn number(&self) -> u8 {
        match self {
            DealBatch::First => 1,
            DealBatch::Second => 2,
            DealBatch::Third => 3,
        }
    }

    pub fn is_last(&self) -> bool {
        matches!(self, DealBatch::Third)
    }

    /// `(seat, count)` pairs in dealing order, starting left of the chooser.
    /// The first batch skips the chooser, who already holds five cards.
    pub fn allocations(&self, chooser: usize) -> Vec<(usize, usize)> {
        let order = (1..=SEATS).map(|offset| (chooser + offset) % SEATS);
        match self {
            DealBatch::First => order
                .filter(|seat| *seat != chooser)
                .map(|seat| (seat, 5))
                .collect(),
            DealBatch::Second | DealBatch::Third => order.map(|seat| (seat, 4)).collect(),
        }
    }

    pub fn card_count(&self, chooser: usize) -> usize {
        self.allocations(chooser).iter().map(|(_, count)| count).sum()
    }
}
