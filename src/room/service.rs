use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::expiry::DisconnectTimers;
use super::models::{Room, RoomId, Seat, SeatId};
use super::registry::{ClaimKind, ClaimedSeat, JoinRequest, RoomRegistry};
use crate::config::TimingConfig;
use crate::game::{GameService, Phase};
use crate::shared::AppError;
use crate::websockets::broadcaster::{player_summaries, seat_payload, Broadcaster, Outbox};
use crate::websockets::messages::{JoinRoomPayload, SeatPayload, WebSocketMessage};

/// Result of a successful join.
#[derive(Debug)]
pub struct JoinedSeat {
    pub seat_id: SeatId,
    pub room_id: RoomId,
    pub kind: ClaimKind,
    /// Set when this join filled the room and kicked off the opening deal.
    pub match_start: Option<JoinHandle<()>>,
}

/// Seat lifecycle: joining, reconnecting, leaving, and expiry of seats whose
/// connection dropped.
pub struct RoomService {
    registry: Arc<RoomRegistry>,
    broadcaster: Broadcaster,
    game_service: Arc<GameService>,
    timers: DisconnectTimers,
    reconnect_grace: Duration,
    cross_room_replacement: bool,
}

fn payload_for(seat: &Seat) -> SeatPayload {
    SeatPayload {
        seat_id: Some(seat.id.clone()),
        name: Some(seat.name.clone()),
        seat_index: seat.index,
        team: seat.team,
    }
}

impl RoomService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        broadcaster: Broadcaster,
        game_service: Arc<GameService>,
        timing: TimingConfig,
        cross_room_replacement: bool,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            game_service,
            timers: DisconnectTimers::new(),
            reconnect_grace: timing.reconnect_grace,
            cross_room_replacement,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub async fn pending_expiries(&self) -> usize {
        self.timers.pending_count().await
    }

    /// Seats a new connection. Reconnection by origin is tried first, then
    /// healing a seat someone left, then an ordinary free seat.
    #[instrument(skip(self, request), fields(connection_id = %request.connection_id))]
    pub async fn join(self: &Arc<Self>, request: JoinRequest) -> Result<JoinedSeat, AppError> {
        let ClaimedSeat {
            kind,
            seat_id,
            room,
            resumed,
        } = self
            .registry
            .claim_seat(&request, self.cross_room_replacement)
            .await?;

        let seat = room.seat(&seat_id).cloned().ok_or(AppError::Internal)?;
        let mut outbox = Outbox::new();
        outbox.to_seat(
            &room,
            &seat_id,
            WebSocketMessage::join_room(JoinRoomPayload {
                room_id: room.id.clone(),
                seat_id: seat_id.clone(),
                seat_index: seat.index,
                team: seat.team,
                name: seat.name.clone(),
                players: player_summaries(&room),
                reconnected: kind == ClaimKind::Reconnected,
            }),
        );

        match kind {
            ClaimKind::Reconnected => {
                outbox.broadcast_except(
                    &room,
                    &seat_id,
                    WebSocketMessage::player_reconnected(payload_for(&seat)),
                );
            }
            ClaimKind::Replaced => {
                outbox.broadcast_except(
                    &room,
                    &seat_id,
                    WebSocketMessage::player_replaced(payload_for(&seat)),
                );
            }
            ClaimKind::Seated => {}
        }

        if resumed {
            info!(room_id = %room.id, "Match resumed");
            let turn = room.game.current_turn();
            let turn_seat = room.seat_at(turn).map(|s| s.id.clone());
            outbox.broadcast(&room, WebSocketMessage::game_resumed(turn_seat.clone(), turn));
            if room.game.phase() == Phase::Playing {
                outbox.broadcast(&room, WebSocketMessage::turn_update(turn_seat, turn));
            }
        }

        Self::resend_trump_prompt(&room, &seat, &mut outbox);
        outbox.game_updates(&room);

        let starts_match = kind == ClaimKind::Seated
            && room.is_full()
            && room.game.phase() == Phase::Seating;
        let room_id = room.id.clone();
        drop(room);

        if kind == ClaimKind::Reconnected && self.timers.cancel(&seat_id).await {
            debug!(seat_id = %seat_id, "Pending expiry cancelled");
        }
        self.broadcaster.deliver(outbox).await;

        let match_start = if starts_match {
            info!(room_id = %room_id, "Room full, starting match");
            let game_service = self.game_service.clone();
            let id = room_id.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = game_service.start_match(&id).await {
                    warn!(room_id = %id, error = %e, "Failed to start match");
                }
            }))
        } else {
            None
        };

        Ok(JoinedSeat {
            seat_id,
            room_id,
            kind,
            match_start,
        })
    }

    /// The chooser's five cards are only sent once; a seat taking over the
    /// chooser index mid-bid needs them again.
    fn resend_trump_prompt(room: &Room, seat: &Seat, outbox: &mut Outbox) {
        if room.game.phase() == Phase::Bidding && room.game.trump_chooser() == Some(seat.index) {
            let cards = room.game.hand(seat.index).to_vec();
            outbox.to_seat(room, &seat.id, WebSocketMessage::choose_trump(cards));
        }
    }

    /// Explicit leave. Before the deal or after the match the seat is simply
    /// freed; mid-match it is saved for a replacement and the room pauses.
    #[instrument(skip(self))]
    pub async fn leave(&self, seat_id: &str, connection_id: &str) -> Result<(), AppError> {
        let mut lock = self
            .registry
            .lock_seat(seat_id)
            .await
            .ok_or_else(|| AppError::NotSeated(seat_id.to_string()))?;

        let seat = lock
            .room
            .seat_held_by(seat_id, connection_id)
            .cloned()
            .ok_or_else(|| AppError::NotSeated(seat_id.to_string()))?;
        let mid_match = !matches!(lock.room.game.phase(), Phase::Seating | Phase::MatchEnd);
        if mid_match {
            lock.room.save_seat(seat_id);
            lock.room.game.set_paused(true);
        } else {
            lock.room.remove_seat(seat_id);
        }
        let room = lock.finish();

        info!(
            room_id = %room.id,
            seat_id = %seat_id,
            seat_index = seat.index,
            paused = mid_match,
            "Seat left"
        );

        let mut outbox = Outbox::new();
        outbox.broadcast(&room, WebSocketMessage::player_left(payload_for(&seat), "left"));
        if mid_match {
            outbox.broadcast(
                &room,
                WebSocketMessage::game_paused("player_left", room.missing_indices()),
            );
        }
        outbox.game_updates(&room);
        if let Some(connection_id) = seat.connection_id {
            outbox.close(connection_id);
        }
        drop(room);

        self.timers.cancel(seat_id).await;
        self.broadcaster.deliver(outbox).await;
        Ok(())
    }

    /// Marks the seat disconnected if `connection_id` is still its live
    /// connection, and schedules its expiry. A bare disconnect never pauses.
    #[instrument(skip(self))]
    pub async fn disconnect(self: &Arc<Self>, seat_id: &str, connection_id: &str) {
        let Some(handle) = self.registry.locate(seat_id).await else {
            debug!(seat_id = %seat_id, "Disconnect for unseated connection");
            return;
        };

        let outbox = {
            let mut room = handle.lock().await;
            if room.seat_held_by(seat_id, connection_id).is_none() {
                debug!(seat_id = %seat_id, "Stale connection closed, seat untouched");
                return;
            }
            let Some(seat) = room.seat_mut(seat_id) else {
                return;
            };
            seat.connected = false;
            seat.connection_id = None;
            let index = seat.index;

            info!(room_id = %room.id, seat_id = %seat_id, seat_index = index, "Seat disconnected");
            let mut outbox = Outbox::new();
            outbox.broadcast(&room, WebSocketMessage::player_disconnected(seat_payload(&room, index)));
            outbox.game_updates(&room);
            outbox
        };
        self.broadcaster.deliver(outbox).await;

        let service = self.clone();
        let id = seat_id.to_string();
        self.timers
            .schedule(seat_id.to_string(), self.reconnect_grace, move |token| async move {
                service.expire_seat(&id, token).await;
            })
            .await;
    }

    /// Removes a seat whose grace period ran out, unless it came back.
    #[instrument(skip(self))]
    pub async fn expire_seat(&self, seat_id: &str, token: u64) {
        let outbox = match self.registry.lock_seat(seat_id).await {
            Some(mut lock) => {
                let expired = lock.room.seat(seat_id).filter(|s| !s.connected).cloned();
                match expired {
                    Some(seat) => {
                        lock.room.remove_seat(seat_id);
                        let room = lock.finish();
                        info!(room_id = %room.id, seat_id = %seat_id, seat_index = seat.index, "Seat expired");

                        let mut outbox = Outbox::new();
                        outbox.broadcast(
                            &room,
                            WebSocketMessage::player_left(payload_for(&seat), "expired"),
                        );
                        outbox.game_updates(&room);
                        Some(outbox)
                    }
                    None => None,
                }
            }
            None => None,
        };

        self.timers.complete(seat_id, token).await;
        if let Some(outbox) = outbox {
            self.broadcaster.deliver(outbox).await;
        }
    }
}
