use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::cards::{Card, Deck, Suit};
use super::dealing::DealBatch;
use super::logic::Phase;
use crate::config::TimingConfig;
use crate::history::{MatchHistoryRepository, MatchRecord};
use crate::room::models::Room;
use crate::room::registry::{RoomHandle, RoomRegistry};
use crate::shared::AppError;
use crate::websockets::broadcaster::{seat_payload, Broadcaster, Outbox};
use crate::websockets::messages::{RoundWinnerPayload, TrickWinnerPayload, WebSocketMessage};

/// Drives a room's game: the opening lottery, trump selection and the paced
/// deal that follows it, and card play through to the end of the match.
pub struct GameService {
    registry: Arc<RoomRegistry>,
    broadcaster: Broadcaster,
    history: Arc<dyn MatchHistoryRepository + Send + Sync>,
    timing: TimingConfig,
}

/// Index of the acting seat; a connection that no longer holds it is not seated.
fn acting_index(room: &Room, seat_id: &str, connection_id: &str) -> Result<usize, AppError> {
    room.seat_held_by(seat_id, connection_id)
        .map(|s| s.index)
        .ok_or_else(|| AppError::NotSeated(seat_id.to_string()))
}

fn seat_id_at(room: &Room, index: usize) -> Option<String> {
    room.seat_at(index).map(|s| s.id.clone())
}

impl GameService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        broadcaster: Broadcaster,
        history: Arc<dyn MatchHistoryRepository + Send + Sync>,
        timing: TimingConfig,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            history,
            timing,
        }
    }

    async fn resolve(&self, seat_id: &str) -> Result<RoomHandle, AppError> {
        self.registry
            .locate(seat_id)
            .await
            .ok_or_else(|| AppError::NotSeated(seat_id.to_string()))
    }

    /// Runs the Ace lottery for a full room and hands the chooser their first
    /// five cards. A room that is not full or already started is left alone.
    #[instrument(skip(self))]
    pub async fn start_match(&self, room_id: &str) -> Result<(), AppError> {
        let handle = self
            .registry
            .get_room(room_id)
            .await
            .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))?;

        let (draws, recipients) = {
            let mut room = handle.lock().await;
            if room.game.is_started() || !room.is_full() {
                debug!(room_id = %room_id, "Match not startable, skipping");
                return Ok(());
            }

            let (lottery, _) = room
                .game
                .begin_match(Deck::shuffled(), Deck::shuffled())
                .map_err(|e| {
                    error!(room_id = %room_id, error = %e, "Ace lottery failed");
                    AppError::from(e)
                })?;
            info!(
                room_id = %room_id,
                chooser = lottery.chooser,
                cards_drawn = lottery.draws.len(),
                "Trump chooser selected"
            );

            let draws: Vec<WebSocketMessage> = lottery
                .draws
                .iter()
                .map(|draw| WebSocketMessage::dealing_card(seat_id_at(&room, draw.seat), draw.seat, draw.card))
                .collect();
            let recipients: Vec<String> = room.connections().into_iter().map(|(_, c)| c).collect();
            (draws, recipients)
        };

        for (i, message) in draws.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.timing.deal_card_delay).await;
            }
            for connection_id in &recipients {
                self.broadcaster.send(connection_id, message).await;
            }
        }

        let outbox = {
            let room = handle.lock().await;
            let mut outbox = Outbox::new();
            if let Some(chooser) = room.game.trump_chooser() {
                outbox.broadcast(&room, WebSocketMessage::trump_player_selected(seat_payload(&room, chooser)));
                // the chooser may already have picked while the lottery was animating
                if room.game.phase() == Phase::Bidding {
                    if let Some(seat_id) = seat_id_at(&room, chooser) {
                        let cards = room.game.hand(chooser).to_vec();
                        outbox.to_seat(&room, &seat_id, WebSocketMessage::choose_trump(cards));
                    }
                }
            }
            outbox.game_updates(&room);
            outbox
        };
        self.broadcaster.deliver(outbox).await;
        Ok(())
    }

    /// Sets trump for the acting seat, then deals the remainder in paced
    /// batches on a separate task, whose handle is returned.
    #[instrument(skip(self))]
    pub async fn choose_trump(
        self: &Arc<Self>,
        seat_id: &str,
        connection_id: &str,
        suit: Suit,
    ) -> Result<JoinHandle<()>, AppError> {
        let handle = self.resolve(seat_id).await?;

        let (outbox, generation) = {
            let mut room = handle.lock().await;
            let index = acting_index(&room, seat_id, connection_id)?;
            room.game.choose_trump(index, suit)?;
            info!(room_id = %room.id, seat_index = index, suit = %suit, "Trump chosen");

            let mut outbox = Outbox::new();
            outbox.broadcast(&room, WebSocketMessage::trump_suit_selected(suit, index));
            (outbox, room.game.deal_generation())
        };
        self.broadcaster.deliver(outbox).await;

        let service = self.clone();
        Ok(tokio::spawn(async move {
            service.deal_remainder(handle, generation).await;
        }))
    }

    async fn deal_remainder(&self, handle: RoomHandle, generation: u64) {
        for batch in DealBatch::ALL {
            tokio::time::sleep(self.timing.deal_batch_delay).await;

            let outbox = {
                let mut room = handle.lock().await;
                if room.game.deal_generation() != generation
                    || room.game.phase() != Phase::DealingRemainder
                {
                    debug!(room_id = %room.id, "Deal superseded, stopping");
                    return;
                }

                let dealt = match room.game.deal_batch(batch) {
                    Ok(dealt) => dealt,
                    Err(e) => {
                        error!(room_id = %room.id, batch = batch.number(), error = %e, "Dealing aborted");
                        return;
                    }
                };
                room.collect_saved_hands();
                debug!(room_id = %room.id, batch = batch.number(), "Batch dealt");

                let mut outbox = Outbox::new();
                for (index, cards) in dealt {
                    if let Some(seat_id) = seat_id_at(&room, index) {
                        let hand_size = room.game.hand(index).len();
                        outbox.to_seat(
                            &room,
                            &seat_id,
                            WebSocketMessage::deal_cards_batch(batch.number(), cards, hand_size),
                        );
                    }
                }
                if batch.is_last() {
                    let turn = room.game.current_turn();
                    outbox.broadcast(&room, WebSocketMessage::turn_update(seat_id_at(&room, turn), turn));
                    outbox.game_updates(&room);
                }
                outbox
            };
            self.broadcaster.deliver(outbox).await;
        }
    }

    #[instrument(skip(self))]
    pub async fn play_card(
        &self,
        seat_id: &str,
        connection_id: &str,
        card: Card,
    ) -> Result<(), AppError> {
        let handle = self.resolve(seat_id).await?;

        let (outbox, record) = {
            let mut room = handle.lock().await;
            let index = acting_index(&room, seat_id, connection_id)?;
            let outcome = room.game.play_card(index, card)?;
            debug!(room_id = %room.id, seat_index = index, card = %card, "Card played");

            let mut outbox = Outbox::new();
            outbox.broadcast(
                &room,
                WebSocketMessage::card_played(Some(seat_id.to_string()), index, card),
            );

            if let Some(trick) = &outcome.trick {
                outbox.broadcast(
                    &room,
                    WebSocketMessage::trick_winner(TrickWinnerPayload {
                        seat_id: seat_id_at(&room, trick.winner_seat),
                        seat_index: trick.winner_seat,
                        team: trick.winner_team,
                        cards: trick.cards.clone(),
                        trick_tally: trick.trick_tally,
                    }),
                );
            }

            if let Some(round) = &outcome.round {
                info!(
                    room_id = %room.id,
                    round = round.round,
                    winner = %round.winner,
                    points = round.points,
                    "Round finished"
                );
                outbox.broadcast(
                    &room,
                    WebSocketMessage::round_winner(RoundWinnerPayload {
                        round: round.round,
                        team: round.winner,
                        points: round.points,
                        kind: round.kind,
                        trick_tally: round.trick_tally,
                        round_tally: round.round_tally,
                    }),
                );
            }

            let mut record = None;
            if let Some(winner) = outcome.match_winner {
                let tally = room.game.round_tally();
                info!(room_id = %room.id, winner = %winner, "Match finished");
                outbox.broadcast(
                    &room,
                    WebSocketMessage::game_over(winner, tally, room.game.round()),
                );
                record = Some(MatchRecord::new(
                    room.id.clone(),
                    room.seats().iter().map(|s| s.id.clone()).collect(),
                    winner,
                    tally,
                    room.game.round(),
                ));
            }

            if let Some(next) = &outcome.next_round {
                outbox.broadcast(
                    &room,
                    WebSocketMessage::trump_player_selected(seat_payload(&room, next.chooser)),
                );
                if let Some(chooser_id) = seat_id_at(&room, next.chooser) {
                    outbox.to_seat(
                        &room,
                        &chooser_id,
                        WebSocketMessage::choose_trump(next.chooser_cards.clone()),
                    );
                }
            }

            if room.game.phase() == Phase::Playing {
                let turn = room.game.current_turn();
                outbox.broadcast(&room, WebSocketMessage::turn_update(seat_id_at(&room, turn), turn));
            }
            outbox.game_updates(&room);
            (outbox, record)
        };
        self.broadcaster.deliver(outbox).await;

        if let Some(record) = record {
            if let Err(e) = self.history.record_match(&record).await {
                warn!(error = %e, room_id = %record.room_id, "Failed to store match result");
            }
        }
        Ok(())
    }
}
