// One match of Hokm. Seats are addressed by index 0..4; hands live here, not on seats,
// so a seat can be vacated and refilled without moving cards around.
use serde::{Deserialize, Serialize};

use super::cards::{Card, Deck, Suit};
use super::dealing::{run_ace_lottery, DealBatch, LotteryResult, CHOOSER_HAND_SIZE};
use super::scoring::{score_round, RoundKind, Team, TeamTally};
use crate::config::RulesConfig;

pub const SEATS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Seating,
    ChoosingTrump,
    Bidding,
    DealingRemainder,
    Playing,
    MatchEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("It is not this seat's turn")]
    NotYourTurn,
    #[error("Card not in hand: {0}")]
    CardNotInHand(Card),
    #[error("Must follow the led suit: {0}")]
    MustFollowSuit(Suit),
    #[error("Only the trump chooser can pick trump")]
    NotTrumpChooser,
    #[error("Action not allowed in phase {0:?}")]
    WrongPhase(Phase),
    #[error("Game is paused")]
    Paused,
    #[error("Match is over")]
    MatchOver,
    #[error("Deck exhausted while dealing")]
    DeckExhausted,
    #[error("Seat index out of range: {0}")]
    SeatOutOfRange(usize),
    #[error("Trump has already been chosen")]
    TrumpAlreadyChosen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayedCard {
    pub seat: usize,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrickResult {
    pub cards: Vec<PlayedCard>,
    pub winner_seat: usize,
    pub winner_team: Team,
    pub trick_tally: TeamTally,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub round: u32,
    pub winner: Team,
    pub points: u32,
    pub kind: RoundKind,
    pub trick_tally: TeamTally,
    pub round_tally: TeamTally,
}

/// The next round's deal, started as soon as the previous round is scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRound {
    pub round: u32,
    pub chooser: usize,
    pub chooser_cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayOutcome {
    pub played: PlayedCard,
    pub trick: Option<TrickResult>,
    pub round: Option<RoundResult>,
    pub next_round: Option<NextRound>,
    pub match_winner: Option<Team>,
}

/// Winner of a trick: the highest trump if any was played, otherwise the highest
/// card of the led suit. The seat comes from the play order, not seat order.
pub fn trick_winner(trick: &[PlayedCard], trump: Option<Suit>) -> Option<usize> {
    let led = trick.first()?.card.suit;
    let winning_suit = match trump {
        Some(trump) if trick.iter().any(|p| p.card.suit == trump) => trump,
        _ => led,
    };

    trick
        .iter()
        .filter(|p| p.card.suit == winning_suit)
        .max_by_key(|p| p.card.value())
        .map(|p| p.seat)
}

#[derive(Debug, Clone)]
pub struct Game {
    deck: Deck,
    trump_suit: Option<Suit>,
    hands: [Vec<Card>; SEATS],
    trick: Vec<PlayedCard>,
    trick_tally: TeamTally,
    round_tally: TeamTally,
    current_turn: usize,
    trump_chooser: Option<usize>,
    round: u32,
    phase: Phase,
    paused: bool,
    deal_generation: u64,
    winner: Option<Team>,
    rules: RulesConfig,
}

impl Game {
    pub fn new(rules: RulesConfig) -> Self {
        Self {
            deck: Deck::default(),
            trump_suit: None,
            hands: Default::default(),
            trick: Vec::new(),
            trick_tally: TeamTally::default(),
            round_tally: TeamTally::default(),
            current_turn: 0,
            trump_chooser: None,
            round: 1,
            phase: Phase::Seating,
            paused: false,
            deal_generation: 0,
            winner: None,
            rules,
        }
    }

    /// A game already in the trick loop, with the chooser to lead.
    #[doc(hidden)]
    pub fn in_play(
        rules: RulesConfig,
        hands: [Vec<Card>; SEATS],
        trump: Suit,
        chooser: usize,
    ) -> Self {
        let mut game = Self::new(rules);
        game.hands = hands;
        game.trump_suit = Some(trump);
        game.trump_chooser = Some(chooser % SEATS);
        game.current_turn = chooser % SEATS;
        game.phase = Phase::Playing;
        game
    }

    #[doc(hidden)]
    pub fn with_round_tally(mut self, tally: TeamTally) -> Self {
        self.round_tally = tally;
        self
    }

    #[doc(hidden)]
    pub fn with_trick_tally(mut self, tally: TeamTally) -> Self {
        self.trick_tally = tally;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn trump_suit(&self) -> Option<Suit> {
        self.trump_suit
    }

    pub fn trump_chooser(&self) -> Option<usize> {
        self.trump_chooser
    }

    pub fn trump_team(&self) -> Option<Team> {
        self.trump_chooser.map(Team::for_seat)
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn trick_tally(&self) -> TeamTally {
        self.trick_tally
    }

    pub fn round_tally(&self) -> TeamTally {
        self.round_tally
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn rules(&self) -> RulesConfig {
        self.rules
    }

    pub fn deal_generation(&self) -> u64 {
        self.deal_generation
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    pub fn hand(&self, seat: usize) -> &[Card] {
        self.hands.get(seat).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Empties a seat's hand, handing the cards to the caller.
    pub fn take_hand(&mut self, seat: usize) -> Vec<Card> {
        self.hands.get_mut(seat).map(std::mem::take).unwrap_or_default()
    }

    pub fn restore_hand(&mut self, seat: usize, cards: Vec<Card>) {
        if let Some(hand) = self.hands.get_mut(seat) {
            hand.extend(cards);
        }
    }

    pub fn trick(&self) -> &[PlayedCard] {
        &self.trick
    }

    pub fn current_trick(&self) -> Vec<Card> {
        self.trick.iter().map(|p| p.card).collect()
    }

    pub fn trick_play_order(&self) -> Vec<usize> {
        self.trick.iter().map(|p| p.seat).collect()
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Seating
    }

    /// Runs the Ace lottery on `lottery_deck` and deals the chooser's first five
    /// cards from `deal_deck`. Only valid while seating.
    pub fn begin_match(
        &mut self,
        mut lottery_deck: Deck,
        deal_deck: Deck,
    ) -> Result<(LotteryResult, Vec<Card>), GameError> {
        if self.phase != Phase::Seating {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.phase = Phase::ChoosingTrump;

        let lottery = run_ace_lottery(&mut lottery_deck)?;
        self.trump_chooser = Some(lottery.chooser);
        let cards = self.deal_to_chooser(deal_deck)?;
        Ok((lottery, cards))
    }

    /// Replaces the deck, clears every hand and gives the chooser their first five cards.
    pub fn deal_to_chooser(&mut self, deck: Deck) -> Result<Vec<Card>, GameError> {
        let chooser = self.trump_chooser.ok_or(GameError::WrongPhase(self.phase))?;

        self.deck = deck;
        self.hands = Default::default();
        self.trick.clear();
        self.trump_suit = None;
        self.deal_generation += 1;

        let cards = self
            .deck
            .draw_many(CHOOSER_HAND_SIZE)
            .ok_or(GameError::DeckExhausted)?;
        self.hands[chooser] = cards.clone();
        self.current_turn = chooser;
        self.phase = Phase::Bidding;
        Ok(cards)
    }

    pub fn choose_trump(&mut self, seat: usize, suit: Suit) -> Result<(), GameError> {
        self.ensure_actionable()?;
        if self.trump_suit.is_some() {
            return Err(GameError::TrumpAlreadyChosen);
        }
        if self.phase != Phase::Bidding {
            return Err(GameError::WrongPhase(self.phase));
        }
        if self.trump_chooser != Some(seat) {
            return Err(GameError::NotTrumpChooser);
        }

        self.trump_suit = Some(suit);
        self.phase = Phase::DealingRemainder;
        Ok(())
    }

    /// Deals one remainder batch. The last batch moves the game into play with
    /// the chooser leading. Either the whole batch is dealt or nothing is.
    pub fn deal_batch(&mut self, batch: DealBatch) -> Result<Vec<(usize, Vec<Card>)>, GameError> {
        if self.phase != Phase::DealingRemainder {
            return Err(GameError::WrongPhase(self.phase));
        }
        let chooser = self.trump_chooser.ok_or(GameError::WrongPhase(self.phase))?;
        if self.deck.remaining() < batch.card_count(chooser) {
            return Err(GameError::DeckExhausted);
        }

        let mut dealt = Vec::with_capacity(SEATS);
        for (seat, count) in batch.allocations(chooser) {
            let cards = self
                .deck
                .draw_many(count)
                .ok_or(GameError::DeckExhausted)?;
            self.hands[seat].extend_from_slice(&cards);
            dealt.push((seat, cards));
        }

        if batch.is_last() {
            self.phase = Phase::Playing;
            self.current_turn = chooser;
        }
        Ok(dealt)
    }

    pub fn is_legal_play(&self, seat: usize, card: &Card) -> Result<(), GameError> {
        if seat >= SEATS {
            return Err(GameError::SeatOutOfRange(seat));
        }
        if seat != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        let hand = &self.hands[seat];
        if !hand.contains(card) {
            return Err(GameError::CardNotInHand(*card));
        }

        if let Some(led) = self.trick.first().map(|p| p.card.suit) {
            if card.suit != led && hand.iter().any(|c| c.suit == led) {
                return Err(GameError::MustFollowSuit(led));
            }
        }
        Ok(())
    }

    pub fn play_card(&mut self, seat: usize, card: Card) -> Result<PlayOutcome, GameError> {
        self.ensure_actionable()?;
        if self.phase != Phase::Playing {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.is_legal_play(seat, &card)?;

        self.hands[seat].retain(|c| *c != card);
        let played = PlayedCard { seat, card };
        self.trick.push(played);
        self.current_turn = (seat + 1) % SEATS;

        let mut outcome = PlayOutcome {
            played,
            trick: None,
            round: None,
            next_round: None,
            match_winner: None,
        };

        if self.trick.len() < SEATS {
            return Ok(outcome);
        }

        let trick = self.complete_trick()?;
        let round_over = self.trick_tally.reached(self.rules.round_trick_threshold).is_some()
            || self.hands.iter().all(Vec::is_empty);
        outcome.trick = Some(trick);

        if round_over {
            let round = self.complete_round()?;
            let winner = round.winner;
            outcome.round = Some(round);

            if self.round_tally.get(winner) >= self.rules.match_target {
                self.phase = Phase::MatchEnd;
                self.winner = Some(winner);
                outcome.match_winner = Some(winner);
            } else {
                outcome.next_round = Some(self.start_next_round(winner, Deck::shuffled())?);
            }
        }

        Ok(outcome)
    }

    fn ensure_actionable(&self) -> Result<(), GameError> {
        if self.phase == Phase::MatchEnd {
            return Err(GameError::MatchOver);
        }
        if self.paused {
            return Err(GameError::Paused);
        }
        Ok(())
    }

    fn complete_trick(&mut self) -> Result<TrickResult, GameError> {
        let winner_seat =
            trick_winner(&self.trick, self.trump_suit).ok_or(GameError::WrongPhase(self.phase))?;
        let winner_team = Team::for_seat(winner_seat);
        self.trick_tally.add(winner_team, 1);
        self.current_turn = winner_seat;

        Ok(TrickResult {
            cards: std::mem::take(&mut self.trick),
            winner_seat,
            winner_team,
            trick_tally: self.trick_tally,
        })
    }

    fn complete_round(&mut self) -> Result<RoundResult, GameError> {
        let trump_team = self.trump_team().ok_or(GameError::WrongPhase(self.phase))?;
        // a round can only run out of cards with the threshold unmet if rules are
        // misconfigured; the leading team takes it
        let threshold = self
            .rules
            .round_trick_threshold
            .min(self.trick_tally.team1.max(self.trick_tally.team2));
        let score = score_round(&self.trick_tally, trump_team, threshold)
            .ok_or(GameError::WrongPhase(self.phase))?;
        self.round_tally.add(score.winner, score.points);

        Ok(RoundResult {
            round: self.round,
            winner: score.winner,
            points: score.points,
            kind: score.kind,
            trick_tally: self.trick_tally,
            round_tally: self.round_tally,
        })
    }

    /// Resets the round state and deals the (possibly rotated) chooser in.
    /// The chooser passes left only when the defending team took the round.
    pub fn start_next_round(&mut self, winner: Team, deck: Deck) -> Result<NextRound, GameError> {
        let chooser = self.trump_chooser.ok_or(GameError::WrongPhase(self.phase))?;
        let next_chooser = if winner != Team::for_seat(chooser) {
            (chooser + 1) % SEATS
        } else {
            chooser
        };

        self.trick_tally.reset();
        self.round += 1;
        self.trump_chooser = Some(next_chooser);
        let chooser_cards = self.deal_to_chooser(deck)?;

        Ok(NextRound {
            round: self.round,
            chooser: next_chooser,
            chooser_cards,
        })
    }
}
