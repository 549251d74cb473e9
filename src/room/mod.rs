// Public API - what other modules can use
pub use expiry::DisconnectTimers;
pub use handlers::list_rooms;
pub use registry::{ClaimKind, ClaimedSeat, JoinRequest, RoomHandle, RoomRegistry, SeatLock};
pub use service::{JoinedSeat, RoomService};

// Internal modules
mod expiry;
mod handlers;
pub mod models;
pub mod registry;
mod service;
