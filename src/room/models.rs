use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::RulesConfig;
use crate::game::{Card, Game, Phase, Team, SEATS};

pub type RoomId = String;
pub type SeatId = String;
pub type ConnectionId = String;

/// Where a connection comes from, used to recognise a returning player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub user_id: Option<String>,
    pub address: String,
}

impl Origin {
    pub fn new(user_id: Option<String>, address: impl Into<String>) -> Self {
        Self {
            user_id,
            address: address.into(),
        }
    }

    /// Authenticated origins match on user id, guests on address.
    pub fn matches(&self, other: &Origin) -> bool {
        match (&self.user_id, &other.user_id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.address == other.address,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Seat {
    pub id: SeatId,
    pub name: String,
    pub index: usize,
    pub team: Team,
    pub connection_id: Option<ConnectionId>,
    pub connected: bool,
    pub origin: Origin,
}

impl Seat {
    pub fn new(
        id: SeatId,
        name: String,
        index: usize,
        origin: Origin,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            id,
            name,
            index,
            team: Team::for_seat(index),
            connection_id: Some(connection_id),
            connected: true,
            origin,
        }
    }
}

/// A seat whose occupant left mid-match, held until someone replaces it.
/// The hand lives here, not in the game, while the seat is vacant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSeat {
    pub seat_id: SeatId,
    pub name: String,
    pub hand: Vec<Card>,
    pub team: Team,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub phase: Phase,
    pub seated: usize,
    pub awaiting_replacement: usize,
    pub round: u32,
    pub paused: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    seats: Vec<Seat>,
    pub game: Game,
    saved: HashMap<SeatId, SavedSeat>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(id: RoomId, rules: RulesConfig) -> Self {
        Self {
            id,
            seats: Vec::with_capacity(SEATS),
            game: Game::new(rules),
            saved: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == seat_id)
    }

    /// The seat, but only while `connection_id` is its live transport.
    pub fn seat_held_by(&self, seat_id: &str, connection_id: &str) -> Option<&Seat> {
        self.seat(seat_id)
            .filter(|s| s.connected && s.connection_id.as_deref() == Some(connection_id))
    }

    pub fn seat_mut(&mut self, seat_id: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id == seat_id)
    }

    pub fn seat_at(&self, index: usize) -> Option<&Seat> {
        self.seats.iter().find(|s| s.index == index)
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= SEATS
    }

    /// Lowest index neither seated nor held for a replacement.
    pub fn free_index(&self) -> Option<usize> {
        (0..SEATS).find(|index| {
            self.seat_at(*index).is_none() && !self.saved.values().any(|s| s.index == *index)
        })
    }

    /// Inserts a seat, keeping seats ordered by index.
    pub fn add_seat(&mut self, seat: Seat) {
        self.seats.push(seat);
        self.seats.sort_by_key(|s| s.index);
    }

    pub fn remove_seat(&mut self, seat_id: &str) -> Option<Seat> {
        let position = self.seats.iter().position(|s| s.id == seat_id)?;
        Some(self.seats.remove(position))
    }

    pub fn find_disconnected(&self, origin: &Origin) -> Option<&Seat> {
        self.seats
            .iter()
            .find(|s| !s.connected && s.origin.matches(origin))
    }

    pub fn has_saved_seat(&self) -> bool {
        !self.saved.is_empty()
    }

    /// The saved seat with the lowest index, if any.
    pub fn next_saved_seat(&self) -> Option<&SavedSeat> {
        self.saved.values().min_by_key(|s| s.index)
    }

    /// Moves an active seat, and its cards, into the saved table.
    pub fn save_seat(&mut self, seat_id: &str) -> Option<SavedSeat> {
        let seat = self.remove_seat(seat_id)?;
        let saved = SavedSeat {
            seat_id: seat.id.clone(),
            name: seat.name,
            hand: self.game.take_hand(seat.index),
            team: seat.team,
            index: seat.index,
        };
        self.saved.insert(seat.id, saved.clone());
        Some(saved)
    }

    /// Removes a saved seat and hands its cards back to the game.
    pub fn restore_saved_seat(&mut self, seat_id: &str) -> Option<SavedSeat> {
        let mut saved = self.saved.remove(seat_id)?;
        let hand = std::mem::take(&mut saved.hand);
        self.game.restore_hand(saved.index, hand);
        Some(saved)
    }

    /// Cards dealt to a vacant index while it waits go to its saved seat.
    pub fn collect_saved_hands(&mut self) {
        for saved in self.saved.values_mut() {
            let dealt = self.game.take_hand(saved.index);
            saved.hand.extend(dealt);
        }
    }

    /// Connection ids of every connected seat.
    pub fn connections(&self) -> Vec<(SeatId, ConnectionId)> {
        self.seats
            .iter()
            .filter(|s| s.connected)
            .filter_map(|s| s.connection_id.clone().map(|c| (s.id.clone(), c)))
            .collect()
    }

    /// Seat indices that are neither seated nor connected.
    pub fn missing_indices(&self) -> Vec<usize> {
        (0..SEATS)
            .filter(|index| self.seat_at(*index).map_or(true, |s| !s.connected))
            .collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            phase: self.game.phase(),
            seated: self.seats.len(),
            awaiting_replacement: self.saved.len(),
            round: self.game.round(),
            paused: self.game.is_paused(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Rank, Suit};

    fn seat(id: &str, index: usize) -> Seat {
        Seat::new(
            id.to_string(),
            id.to_string(),
            index,
            Origin::new(None, "10.0.0.1"),
            format!("conn-{}", id),
        )
    }

    fn hands() -> [Vec<Card>; SEATS] {
        [
            vec![Card::new(Rank::Ace, Suit::Hearts)],
            vec![Card::new(Rank::King, Suit::Hearts)],
            vec![Card::new(Rank::Queen, Suit::Hearts)],
            vec![Card::new(Rank::Jack, Suit::Hearts)],
        ]
    }

    #[test]
    fn test_origin_matching() {
        let guest = Origin::new(None, "1.2.3.4");
        let same_guest = Origin::new(None, "1.2.3.4");
        let user = Origin::new(Some("u1".into()), "1.2.3.4");
        let same_user_elsewhere = Origin::new(Some("u1".into()), "5.6.7.8");

        assert!(guest.matches(&same_guest));
        assert!(user.matches(&same_user_elsewhere));
        assert!(!guest.matches(&user));
        assert!(!guest.matches(&Origin::new(None, "9.9.9.9")));
    }

    #[test]
    fn test_seats_stay_sorted_and_team_follows_index() {
        let mut room = Room::new("r".into(), RulesConfig::default());
        room.add_seat(seat("c", 2));
        room.add_seat(seat("a", 0));
        room.add_seat(seat("b", 1));

        let indices: Vec<usize> = room.seats().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(room.seat("a").unwrap().team, Team::Team2);
        assert_eq!(room.seat("b").unwrap().team, Team::Team1);
        assert_eq!(room.free_index(), Some(3));
    }

    #[test]
    fn test_free_index_skips_saved_seats() {
        let mut room = Room::new("r".into(), RulesConfig::default());
        room.game = Game::in_play(RulesConfig::default(), hands(), Suit::Spades, 0);
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            room.add_seat(seat(id, i));
        }
        assert_eq!(room.free_index(), None);

        room.save_seat("b").unwrap();
        assert_eq!(room.free_index(), None, "index 1 is held for replacement");

        room.remove_seat("c");
        assert_eq!(room.free_index(), Some(2));
    }

    #[test]
    fn test_saved_seat_holds_hand_until_restored() {
        let mut room = Room::new("r".into(), RulesConfig::default());
        room.game = Game::in_play(RulesConfig::default(), hands(), Suit::Spades, 0);
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            room.add_seat(seat(id, i));
        }

        let saved = room.save_seat("b").unwrap();
        assert_eq!(saved.index, 1);
        assert_eq!(saved.team, Team::Team1);
        assert_eq!(saved.hand, vec![Card::new(Rank::King, Suit::Hearts)]);
        assert!(room.game.hand(1).is_empty());
        assert_eq!(room.seats().len(), 3);
        assert_eq!(room.summary().awaiting_replacement, 1);

        // a batch dealt to the vacant index
        room.game.restore_hand(1, vec![Card::new(Rank::Queen, Suit::Hearts)]);
        room.collect_saved_hands();
        assert!(room.game.hand(1).is_empty());
        assert_eq!(room.next_saved_seat().unwrap().hand.len(), 2);

        let restored = room.restore_saved_seat("b").unwrap();
        assert!(restored.hand.is_empty());
        assert_eq!(
            room.game.hand(1),
            &[Card::new(Rank::King, Suit::Hearts), Card::new(Rank::Queen, Suit::Hearts)]
        );
        assert!(!room.has_saved_seat());
    }

    #[test]
    fn test_connections_and_missing_indices() {
        let mut room = Room::new("r".into(), RulesConfig::default());
        room.add_seat(seat("a", 0));
        room.add_seat(seat("b", 1));
        room.seat_mut("b").unwrap().connected = false;

        assert_eq!(
            room.connections(),
            vec![("a".to_string(), "conn-a".to_string())]
        );
        assert_eq!(room.missing_indices(), vec![1, 2, 3]);
        assert!(room
            .find_disconnected(&Origin::new(None, "10.0.0.1"))
            .is_some());
    }
}
