use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("unknown suit: {0}")]
    UnknownSuit(String),
    #[error("unknown rank: {0}")]
    UnknownRank(String),
    #[error("card value {value} does not match rank {rank}")]
    ValueMismatch { rank: Rank, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
            Suit::Clubs => "clubs",
            Suit::Spades => "spades",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Suit {
    type Error = CardError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "hearts" => Ok(Suit::Hearts),
            "diamonds" => Ok(Suit::Diamonds),
            "clubs" => Ok(Suit::Clubs),
            "spades" => Ok(Suit::Spades),
            _ => Err(CardError::UnknownSuit(s.to_string())),
        }
    }
}

/// Card rank. The discriminant is the rank's fixed weight, 2 through 14.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(try_from = "String", into = "String")]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Rank {
    type Error = CardError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Rank::iter()
            .find(|rank| rank.as_str() == s)
            .ok_or_else(|| CardError::UnknownRank(s.to_string()))
    }
}

impl TryFrom<String> for Rank {
    type Error = CardError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rank::try_from(s.as_str())
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.as_str().to_string()
    }
}

/// Wire shape of a card: `{"Suit": "hearts", "Rank": "A", "Value": 14}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPayload {
    #[serde(rename = "Suit")]
    pub suit: Suit,
    #[serde(rename = "Rank")]
    pub rank: Rank,
    #[serde(rename = "Value")]
    pub value: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CardPayload", into = "CardPayload")]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn all_cards() -> Vec<Card> {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::iter() {
            for rank in Rank::iter() {
                cards.push(Card::new(rank, suit));
            }
        }
        cards
    }
}

impl TryFrom<CardPayload> for Card {
    type Error = CardError;

    fn try_from(payload: CardPayload) -> Result<Self, Self::Error> {
        if payload.value != payload.rank.value() {
            return Err(CardError::ValueMismatch {
                rank: payload.rank,
                value: payload.value,
            });
        }
        Ok(Card::new(payload.rank, payload.suit))
    }
}

impl From<Card> for CardPayload {
    fn from(card: Card) -> Self {
        Self {
            suit: card.suit,
            rank: card.rank,
            value: card.value(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.rank, self.suit)
    }
}
