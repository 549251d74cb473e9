use std::sync::Arc;
use tracing::{debug, warn};

use super::connection_manager::ConnectionManager;
use super::messages::{GameUpdatePayload, PlayerSummary, SeatPayload, WebSocketMessage};
use crate::game::Team;
use crate::room::models::{ConnectionId, Room};

/// Messages collected while a room is locked, sent once it is released.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<(ConnectionId, WebSocketMessage)>,
    closes: Vec<ConnectionId>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `message` for every connected seat in the room.
    pub fn broadcast(&mut self, room: &Room, message: WebSocketMessage) {
        for (_, connection_id) in room.connections() {
            self.messages.push((connection_id, message.clone()));
        }
    }

    pub fn broadcast_except(&mut self, room: &Room, seat_id: &str, message: WebSocketMessage) {
        for (id, connection_id) in room.connections() {
            if id != seat_id {
                self.messages.push((connection_id, message.clone()));
            }
        }
    }

    /// Queues `message` for the seat's connection, if it has one.
    pub fn to_seat(&mut self, room: &Room, seat_id: &str, message: WebSocketMessage) {
        if let Some(connection_id) = room
            .seat(seat_id)
            .filter(|s| s.connected)
            .and_then(|s| s.connection_id.clone())
        {
            self.messages.push((connection_id, message));
        }
    }

    /// A `game_update` per connected seat, each showing only its own hand.
    pub fn game_updates(&mut self, room: &Room) {
        for (seat_id, connection_id) in room.connections() {
            self.messages
                .push((connection_id, game_update_for(room, Some(&seat_id))));
        }
    }

    /// Closes the connection after everything queued before it has been sent.
    pub fn close(&mut self, connection_id: ConnectionId) {
        self.closes.push(connection_id);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.closes.is_empty()
    }

    pub fn messages(&self) -> &[(ConnectionId, WebSocketMessage)] {
        &self.messages
    }
}

pub fn player_summaries(room: &Room) -> Vec<PlayerSummary> {
    room.seats()
        .iter()
        .map(|seat| PlayerSummary {
            seat_id: seat.id.clone(),
            name: seat.name.clone(),
            seat_index: seat.index,
            team: seat.team,
            connected: seat.connected,
            card_count: room.game.hand(seat.index).len(),
        })
        .collect()
}

/// Seat identity for broadcasts, by index. The index may be empty.
pub fn seat_payload(room: &Room, index: usize) -> SeatPayload {
    let seat = room.seat_at(index);
    SeatPayload {
        seat_id: seat.map(|s| s.id.clone()),
        name: seat.map(|s| s.name.clone()),
        seat_index: index,
        team: seat.map(|s| s.team).unwrap_or_else(|| Team::for_seat(index)),
    }
}

/// Room snapshot as seen by `viewer`; every other hand is reduced to a count.
pub fn game_update_for(room: &Room, viewer: Option<&str>) -> WebSocketMessage {
    let game = &room.game;
    let hand = viewer
        .and_then(|id| room.seat(id))
        .map(|seat| game.hand(seat.index).to_vec())
        .unwrap_or_default();

    WebSocketMessage::game_update(GameUpdatePayload {
        room_id: room.id.clone(),
        phase: game.phase(),
        round: game.round(),
        trump_suit: game.trump_suit(),
        trump_chooser: game.trump_chooser(),
        current_turn: game.current_turn(),
        paused: game.is_paused(),
        hand,
        players: player_summaries(room),
        current_trick: game.trick().to_vec(),
        trick_tally: game.trick_tally(),
        round_tally: game.round_tally(),
    })
}

/// Delivers outboxes through the connection manager. Best effort: a failed
/// send is logged and skipped.
#[derive(Clone)]
pub struct Broadcaster {
    connections: Arc<dyn ConnectionManager>,
}

impl Broadcaster {
    pub fn new(connections: Arc<dyn ConnectionManager>) -> Self {
        Self { connections }
    }

    pub fn connections(&self) -> &Arc<dyn ConnectionManager> {
        &self.connections
    }

    pub async fn deliver(&self, outbox: Outbox) {
        for (connection_id, message) in outbox.messages {
            self.send(&connection_id, &message).await;
        }
        for connection_id in outbox.closes {
            self.connections.remove_connection(&connection_id).await;
        }
    }

    pub async fn send(&self, connection_id: &str, message: &WebSocketMessage) {
        match serde_json::to_string(message) {
            Ok(text) => {
                if !self.connections.send_to_connection(connection_id, &text).await {
                    debug!(
                        connection_id = %connection_id,
                        message_type = ?message.message_type,
                        "Message not delivered"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, message_type = ?message.message_type, "Failed to serialize message")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::game::{Card, Game, Rank, Suit};
    use crate::room::models::{Origin, Seat};
    use crate::websockets::MessageType;

    fn room_with_hands() -> Room {
        let mut room = Room::new("room".into(), RulesConfig::default());
        room.game = Game::in_play(
            RulesConfig::default(),
            [
                vec![Card::new(Rank::Ace, Suit::Hearts), Card::new(Rank::Two, Suit::Clubs)],
                vec![Card::new(Rank::King, Suit::Hearts)],
                vec![Card::new(Rank::Queen, Suit::Hearts)],
                vec![Card::new(Rank::Jack, Suit::Hearts)],
            ],
            Suit::Clubs,
            0,
        );
        for (index, id) in ["a", "b", "c", "d"].iter().enumerate() {
            room.add_seat(Seat::new(
                id.to_string(),
                id.to_uppercase(),
                index,
                Origin::new(None, "127.0.0.1"),
                format!("conn-{}", id),
            ));
        }
        room
    }

    #[test]
    fn test_game_update_redacts_other_hands() {
        let room = room_with_hands();
        let message = game_update_for(&room, Some("b"));

        assert_eq!(message.message_type, MessageType::GameUpdate);
        let hand = message.payload["hand"].as_array().unwrap();
        assert_eq!(hand.len(), 1);
        assert_eq!(hand[0]["Rank"], "K");

        let players = message.payload["players"].as_array().unwrap();
        assert_eq!(players[0]["card_count"], 2);
        assert!(players[0].get("hand").is_none());
    }

    #[test]
    fn test_broadcast_skips_disconnected_seats() {
        let mut room = room_with_hands();
        room.seat_mut("c").unwrap().connected = false;

        let mut outbox = Outbox::new();
        outbox.broadcast(&room, WebSocketMessage::turn_update(None, 0));
        assert_eq!(outbox.len(), 3);

        let mut except = Outbox::new();
        except.broadcast_except(&room, "a", WebSocketMessage::turn_update(None, 0));
        let targets: Vec<&str> = except.messages().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(targets, vec!["conn-b", "conn-d"]);
    }

    #[test]
    fn test_game_updates_are_per_recipient() {
        let room = room_with_hands();
        let mut outbox = Outbox::new();
        outbox.game_updates(&room);

        assert_eq!(outbox.len(), 4);
        let (connection, message) = &outbox.messages()[0];
        assert_eq!(connection, "conn-a");
        assert_eq!(message.payload["hand"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_seat_payload_for_empty_index() {
        let mut room = room_with_hands();
        room.remove_seat("d");
        let payload = seat_payload(&room, 3);
        assert!(payload.seat_id.is_none());
        assert_eq!(payload.team, Team::Team1);
    }
}
