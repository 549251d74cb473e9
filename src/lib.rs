// Library crate for the Hokm game server
// This file exposes the public API for integration tests

pub mod config;
pub mod game;
pub mod history;
pub mod identity;
pub mod room;
pub mod shared;
pub mod websockets;

use axum::{http::Method, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

// Re-export commonly used types for easier access in tests
pub use config::{RulesConfig, ServerConfig, TimingConfig};
pub use game::{GameService, Team};
pub use room::{JoinRequest, RoomRegistry, RoomService};
pub use shared::{AppError, AppState};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebsocketReceiveHandler,
};

/// HTTP surface: liveness, room listing, and the game socket.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hokm server is running" }))
        .route("/rooms", get(room::list_rooms))
        .route("/ws", get(websockets::websocket_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
