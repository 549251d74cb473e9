use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{Card, Phase, PlayedCard, RoundKind, Suit, Team, TeamTally};

/// Outbound message types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ConnectionAck,
    JoinRoom,
    ChooseTrump,
    DealingCard,
    TrumpPlayerSelected,
    TrumpSuitSelected,
    #[serde(rename = "deal_cards_batch_1")]
    DealCardsBatch1,
    #[serde(rename = "deal_cards_batch_2")]
    DealCardsBatch2,
    #[serde(rename = "deal_cards_batch_3")]
    DealCardsBatch3,
    GameUpdate,
    TurnUpdate,
    CardPlayed,
    TrickWinner,
    RoundWinner,
    GameOver,
    PlayerDisconnected,
    PlayerReconnected,
    PlayerLeft,
    PlayerReplaced,
    GamePaused,
    GameResumed,
    ActionRejected,
}

impl MessageType {
    pub fn deal_batch(number: u8) -> Self {
        match number {
            1 => MessageType::DealCardsBatch1,
            2 => MessageType::DealCardsBatch2,
            _ => MessageType::DealCardsBatch3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for outbound messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub seat_id: String,
    pub name: String,
    pub seat_index: usize,
    pub team: Team,
    pub connected: bool,
    pub card_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionAckPayload {
    pub status: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub seat_id: String,
    pub seat_index: usize,
    pub team: Team,
    pub name: String,
    pub players: Vec<PlayerSummary>,
    pub reconnected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChooseTrumpPayload {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealingCardPayload {
    pub seat_id: Option<String>,
    pub seat_index: usize,
    pub card: Card,
}

/// Identifies a seat in broadcasts about it.
#[derive(Debug, Clone, Serialize)]
pub struct SeatPayload {
    pub seat_id: Option<String>,
    pub name: Option<String>,
    pub seat_index: usize,
    pub team: Team,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrumpSuitSelectedPayload {
    pub suit: Suit,
    pub chooser_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealBatchPayload {
    pub batch: u8,
    pub cards: Vec<Card>,
    pub hand_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameUpdatePayload {
    pub room_id: String,
    pub phase: Phase,
    pub round: u32,
    pub trump_suit: Option<Suit>,
    pub trump_chooser: Option<usize>,
    pub current_turn: usize,
    pub paused: bool,
    /// The recipient's own hand; other hands only appear as counts.
    pub hand: Vec<Card>,
    pub players: Vec<PlayerSummary>,
    pub current_trick: Vec<PlayedCard>,
    pub trick_tally: TeamTally,
    pub round_tally: TeamTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardPlayedPayload {
    pub seat_id: Option<String>,
    pub seat_index: usize,
    pub card: Card,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrickWinnerPayload {
    pub seat_id: Option<String>,
    pub seat_index: usize,
    pub team: Team,
    pub cards: Vec<PlayedCard>,
    pub trick_tally: TeamTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundWinnerPayload {
    pub round: u32,
    pub team: Team,
    pub points: u32,
    pub kind: RoundKind,
    pub trick_tally: TeamTally,
    pub round_tally: TeamTally,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameOverPayload {
    pub winner: Team,
    pub round_tally: TeamTally,
    pub rounds_played: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerLeftPayload {
    #[serde(flatten)]
    pub seat: SeatPayload,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GamePausedPayload {
    pub reason: String,
    pub missing_seats: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnPayload {
    pub seat_id: Option<String>,
    pub seat_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionRejectedPayload {
    pub action: String,
    pub reason: String,
    pub kind: String,
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    fn with_payload<T: Serialize>(message_type: MessageType, payload: &T) -> Self {
        // payloads are plain structs with string keys; serialization cannot fail
        Self::new(
            message_type,
            serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        )
    }

    pub fn connection_ack(connection_id: String) -> Self {
        Self::with_payload(
            MessageType::ConnectionAck,
            &ConnectionAckPayload {
                status: "connecting".to_string(),
                connection_id,
            },
        )
    }

    pub fn join_room(payload: JoinRoomPayload) -> Self {
        Self::with_payload(MessageType::JoinRoom, &payload)
    }

    pub fn choose_trump(cards: Vec<Card>) -> Self {
        Self::with_payload(MessageType::ChooseTrump, &ChooseTrumpPayload { cards })
    }

    pub fn dealing_card(seat_id: Option<String>, seat_index: usize, card: Card) -> Self {
        Self::with_payload(
            MessageType::DealingCard,
            &DealingCardPayload {
                seat_id,
                seat_index,
                card,
            },
        )
    }

    pub fn trump_player_selected(seat: SeatPayload) -> Self {
        Self::with_payload(MessageType::TrumpPlayerSelected, &seat)
    }

    pub fn trump_suit_selected(suit: Suit, chooser_index: usize) -> Self {
        Self::with_payload(
            MessageType::TrumpSuitSelected,
            &TrumpSuitSelectedPayload {
                suit,
                chooser_index,
            },
        )
    }

    pub fn deal_cards_batch(batch: u8, cards: Vec<Card>, hand_size: usize) -> Self {
        Self::with_payload(
            MessageType::deal_batch(batch),
            &DealBatchPayload {
                batch,
                cards,
                hand_size,
            },
        )
    }

    pub fn game_update(payload: GameUpdatePayload) -> Self {
        Self::with_payload(MessageType::GameUpdate, &payload)
    }

    pub fn turn_update(seat_id: Option<String>, seat_index: usize) -> Self {
        Self::with_payload(
            MessageType::TurnUpdate,
            &TurnPayload {
                seat_id,
                seat_index,
            },
        )
    }

    pub fn card_played(seat_id: Option<String>, seat_index: usize, card: Card) -> Self {
        Self::with_payload(
            MessageType::CardPlayed,
            &CardPlayedPayload {
                seat_id,
                seat_index,
                card,
            },
        )
    }

    pub fn trick_winner(payload: TrickWinnerPayload) -> Self {
        Self::with_payload(MessageType::TrickWinner, &payload)
    }

    pub fn round_winner(payload: RoundWinnerPayload) -> Self {
        Self::with_payload(MessageType::RoundWinner, &payload)
    }

    pub fn game_over(winner: Team, round_tally: TeamTally, rounds_played: u32) -> Self {
        Self::with_payload(
            MessageType::GameOver,
            &GameOverPayload {
                winner,
                round_tally,
                rounds_played,
            },
        )
    }

    pub fn player_disconnected(seat: SeatPayload) -> Self {
        Self::with_payload(MessageType::PlayerDisconnected, &seat)
    }

    pub fn player_reconnected(seat: SeatPayload) -> Self {
        Self::with_payload(MessageType::PlayerReconnected, &seat)
    }

    pub fn player_left(seat: SeatPayload, reason: &str) -> Self {
        Self::with_payload(
            MessageType::PlayerLeft,
            &PlayerLeftPayload {
                seat,
                reason: reason.to_string(),
            },
        )
    }

    pub fn player_replaced(seat: SeatPayload) -> Self {
        Self::with_payload(MessageType::PlayerReplaced, &seat)
    }

    pub fn game_paused(reason: &str, missing_seats: Vec<usize>) -> Self {
        Self::with_payload(
            MessageType::GamePaused,
            &GamePausedPayload {
                reason: reason.to_string(),
                missing_seats,
            },
        )
    }

    pub fn game_resumed(seat_id: Option<String>, seat_index: usize) -> Self {
        Self::with_payload(
            MessageType::GameResumed,
            &TurnPayload {
                seat_id,
                seat_index,
            },
        )
    }

    pub fn action_rejected(action: &str, reason: String, kind: &str) -> Self {
        Self::with_payload(
            MessageType::ActionRejected,
            &ActionRejectedPayload {
                action: action.to_string(),
                reason,
                kind: kind.to_string(),
            },
        )
    }
}
