use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockWriteGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::models::{ConnectionId, Origin, Room, RoomId, RoomSummary, Seat, SeatId};
use crate::config::RulesConfig;
use crate::game::Phase;
use crate::shared::AppError;

pub type RoomHandle = Arc<Mutex<Room>>;

/// A new connection asking for a seat.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub name: String,
    pub origin: Origin,
    pub connection_id: ConnectionId,
    /// Room named by the client, if any.
    pub requested_room: Option<RoomId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Reconnected,
    Replaced,
    Seated,
}

/// Outcome of a seat claim. Holds the room lock so the caller can snapshot
/// the room before anyone else touches it.
pub struct ClaimedSeat {
    pub kind: ClaimKind,
    pub seat_id: SeatId,
    pub room: OwnedMutexGuard<Room>,
    /// The pause flag was cleared by this claim.
    pub resumed: bool,
}

/// Registry write lock plus one room's lock, for operations that may unlink a seat.
pub struct SeatLock<'a> {
    state: RwLockWriteGuard<'a, RegistryState>,
    pub room: OwnedMutexGuard<Room>,
    seat_id: SeatId,
}

impl SeatLock<'_> {
    /// Drops the seat from the locator if it is no longer active, then releases
    /// the registry, handing back the room guard.
    pub fn finish(self) -> OwnedMutexGuard<Room> {
        let SeatLock {
            mut state,
            room,
            seat_id,
        } = self;
        if room.seat(&seat_id).is_none() {
            state.locator.remove(&seat_id);
        }
        room
    }
}

#[derive(Default)]
struct RegistryState {
    rooms: HashMap<RoomId, RoomHandle>,
    order: Vec<RoomId>,
    locator: HashMap<SeatId, RoomId>,
}

impl RegistryState {
    fn handles(&self) -> Vec<RoomHandle> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id).cloned())
            .collect()
    }
}

/// Every live room, plus which room each active seat is in.
///
/// Lock order is always registry then room. Anything that changes which seats
/// exist takes the registry write lock; game actions only read it to find
/// their room and then work under that room's mutex.
pub struct RoomRegistry {
    state: RwLock<RegistryState>,
    rules: RulesConfig,
}

impl RoomRegistry {
    pub fn new(rules: RulesConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            rules,
        }
    }

    pub async fn get_room(&self, room_id: &str) -> Option<RoomHandle> {
        self.state.read().await.rooms.get(room_id).cloned()
    }

    /// Room holding the active seat `seat_id`.
    pub async fn locate(&self, seat_id: &str) -> Option<RoomHandle> {
        let state = self.state.read().await;
        let room_id = state.locator.get(seat_id)?;
        state.rooms.get(room_id).cloned()
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.state.read().await.order.clone()
    }

    pub async fn summaries(&self) -> Vec<RoomSummary> {
        let handles = self.state.read().await.handles();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries
    }

    /// Locks the room of an active seat together with the registry.
    pub async fn lock_seat(&self, seat_id: &str) -> Option<SeatLock<'_>> {
        let state = self.state.write().await;
        let handle = state
            .locator
            .get(seat_id)
            .and_then(|room_id| state.rooms.get(room_id))
            .cloned()?;
        let room = handle.lock_owned().await;
        Some(SeatLock {
            state,
            room,
            seat_id: seat_id.to_string(),
        })
    }

    /// Finds a seat for a new connection: a disconnected seat from the same
    /// origin first, then a seat left mid-match, then a fresh seat.
    #[instrument(skip(self, request), fields(connection_id = %request.connection_id))]
    pub async fn claim_seat(
        &self,
        request: &JoinRequest,
        cross_room_replacement: bool,
    ) -> Result<ClaimedSeat, AppError> {
        let mut state = self.state.write().await;
        let handles = state.handles();

        // A returning player takes their own disconnected seat before any vacancy.
        if let Some(claim) = Self::reconnect(&mut state, &handles, request).await {
            return Ok(claim);
        }

        let replacement_candidates: Vec<RoomHandle> = if cross_room_replacement {
            handles.clone()
        } else {
            request
                .requested_room
                .as_ref()
                .and_then(|id| state.rooms.get(id).cloned())
                .into_iter()
                .collect()
        };
        if let Some(claim) = Self::replace(&mut state, &replacement_candidates, request).await {
            return Ok(claim);
        }

        self.seat(&mut state, &handles, request).await
    }

    async fn reconnect(
        state: &mut RegistryState,
        handles: &[RoomHandle],
        request: &JoinRequest,
    ) -> Option<ClaimedSeat> {
        for handle in handles {
            let mut room = handle.clone().lock_owned().await;
            let Some(seat_id) = room.find_disconnected(&request.origin).map(|s| s.id.clone())
            else {
                continue;
            };

            let seat = room.seat_mut(&seat_id)?;
            seat.connected = true;
            seat.connection_id = Some(request.connection_id.clone());
            state.locator.insert(seat_id.clone(), room.id.clone());

            info!(room_id = %room.id, seat_id = %seat_id, "Seat reconnected");
            return Some(ClaimedSeat {
                kind: ClaimKind::Reconnected,
                seat_id,
                room,
                resumed: false,
            });
        }
        None
    }

    async fn replace(
        state: &mut RegistryState,
        candidates: &[RoomHandle],
        request: &JoinRequest,
    ) -> Option<ClaimedSeat> {
        for handle in candidates {
            let mut room = handle.clone().lock_owned().await;
            let Some(saved_id) = room.next_saved_seat().map(|s| s.seat_id.clone()) else {
                continue;
            };
            let saved = room.restore_saved_seat(&saved_id)?;

            room.add_seat(Seat {
                id: saved.seat_id.clone(),
                name: request.name.clone(),
                index: saved.index,
                team: saved.team,
                connection_id: Some(request.connection_id.clone()),
                connected: true,
                origin: request.origin.clone(),
            });
            state.locator.insert(saved.seat_id.clone(), room.id.clone());
            let resumed = Self::resume_if_full(&mut room);

            info!(
                room_id = %room.id,
                seat_id = %saved.seat_id,
                seat_index = saved.index,
                previous = %saved.name,
                resumed,
                "Seat replaced"
            );
            return Some(ClaimedSeat {
                kind: ClaimKind::Replaced,
                seat_id: saved.seat_id,
                room,
                resumed,
            });
        }
        None
    }

    async fn seat(
        &self,
        state: &mut RegistryState,
        handles: &[RoomHandle],
        request: &JoinRequest,
    ) -> Result<ClaimedSeat, AppError> {
        let handle = match Self::find_room_with_space(state, handles, request).await {
            Some(handle) => handle,
            None => self.create_room(state),
        };

        let mut room = handle.lock_owned().await;
        let index = room.free_index().ok_or(AppError::Internal)?;
        let seat_id = Uuid::new_v4().to_string();
        room.add_seat(Seat::new(
            seat_id.clone(),
            request.name.clone(),
            index,
            request.origin.clone(),
            request.connection_id.clone(),
        ));
        state.locator.insert(seat_id.clone(), room.id.clone());
        let resumed = Self::resume_if_full(&mut room);

        info!(
            room_id = %room.id,
            seat_id = %seat_id,
            seat_index = index,
            seated = room.seats().len(),
            "Seat claimed"
        );
        Ok(ClaimedSeat {
            kind: ClaimKind::Seated,
            seat_id,
            room,
            resumed,
        })
    }

    /// A requested room with space wins; otherwise a started match with an
    /// empty seat comes before a room still filling up.
    async fn find_room_with_space(
        state: &RegistryState,
        handles: &[RoomHandle],
        request: &JoinRequest,
    ) -> Option<RoomHandle> {
        if let Some(handle) = request
            .requested_room
            .as_ref()
            .and_then(|id| state.rooms.get(id))
        {
            let room = handle.lock().await;
            if room.game.phase() != Phase::MatchEnd && room.free_index().is_some() {
                return Some(handle.clone());
            }
        }

        let mut filling: Option<RoomHandle> = None;
        for handle in handles {
            let room = handle.lock().await;
            if room.game.phase() == Phase::MatchEnd || room.free_index().is_none() {
                continue;
            }
            if room.game.is_started() {
                return Some(handle.clone());
            }
            if filling.is_none() {
                filling = Some(handle.clone());
            }
        }
        filling
    }

    fn create_room(&self, state: &mut RegistryState) -> RoomHandle {
        let mut room_id = petname::Petnames::default().generate_one(2, "");
        while state.rooms.contains_key(&room_id) {
            room_id = format!("{}{}", room_id, &Uuid::new_v4().simple().to_string()[..4]);
        }

        debug!(room_id = %room_id, "Creating room");
        let handle = Arc::new(Mutex::new(Room::new(room_id.clone(), self.rules)));
        state.rooms.insert(room_id.clone(), handle.clone());
        state.order.push(room_id);
        handle
    }

    fn resume_if_full(room: &mut Room) -> bool {
        if room.game.is_paused() && room.is_full() && !room.has_saved_seat() {
            room.game.set_paused(false);
            return true;
        }
        false
    }
}
