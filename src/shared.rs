use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::game::{GameError, GameService};
use crate::history::MatchHistoryRepository;
use crate::identity::{IdentityService, TokenConfig};
use crate::room::{RoomRegistry, RoomService};
use crate::websockets::{ActionError, Broadcaster, ConnectionManager};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
    pub room_service: Arc<RoomService>,
    pub game_service: Arc<GameService>,
    pub broadcaster: Broadcaster,
    pub identity: Arc<IdentityService>,
    pub history: Arc<dyn MatchHistoryRepository + Send + Sync>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        connections: Arc<dyn ConnectionManager>,
        history: Arc<dyn MatchHistoryRepository + Send + Sync>,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new(config.rules));
        let broadcaster = Broadcaster::new(connections);
        let game_service = Arc::new(GameService::new(
            registry.clone(),
            broadcaster.clone(),
            history.clone(),
            config.timing,
        ));
        let room_service = Arc::new(RoomService::new(
            registry.clone(),
            broadcaster.clone(),
            game_service.clone(),
            config.timing,
            config.cross_room_replacement,
        ));
        let identity = Arc::new(IdentityService::new(
            TokenConfig::new(config.jwt_secret.clone(), TokenConfig::DEFAULT_EXPIRATION_DAYS),
            config.allow_guests,
        ));

        Self {
            registry,
            room_service,
            game_service,
            broadcaster,
            identity,
            history,
            config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Rule(GameError),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Not seated: {0}")]
    NotSeated(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Error class reported in `action_rejected` payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Protocol(_) => "protocol",
            AppError::Rule(_) => "rule_violation",
            AppError::ResourceExhausted(_) => "resource_exhaustion",
            AppError::NotSeated(_) => "not_seated",
            AppError::RoomNotFound(_) => "not_found",
            AppError::JwtError(_) | AppError::Unauthorized(_) => "unauthorized",
            AppError::DatabaseError(_) | AppError::Internal => "internal",
        }
    }
}

impl From<GameError> for AppError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::DeckExhausted => AppError::ResourceExhausted(err.to_string()),
            other => AppError::Rule(other),
        }
    }
}

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        AppError::Protocol(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Protocol(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rule(err) => (StatusCode::CONFLICT, err.to_string()),
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotSeated(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::RoomNotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::ResourceExhausted(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
