use async_trait::async_trait;
use axum::{
    extract::{ws::WebSocket, ConnectInfo, Query, State, WebSocketUpgrade},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::actions::ClientAction;
use super::broadcaster::Broadcaster;
use super::messages::WebSocketMessage;
use super::socket::{Connection, MessageHandler, SocketWrapper};
use crate::game::GameService;
use crate::identity::Identity;
use crate::room::models::Origin;
use crate::room::{JoinRequest, RoomService};
use crate::shared::{AppError, AppState};

/// Dispatches decoded client actions to the services. Anything rejected is
/// reported to the acting connection only.
pub struct WebsocketReceiveHandler {
    game_service: Arc<GameService>,
    room_service: Arc<RoomService>,
    broadcaster: Broadcaster,
}

impl WebsocketReceiveHandler {
    pub fn new(
        game_service: Arc<GameService>,
        room_service: Arc<RoomService>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            game_service,
            room_service,
            broadcaster,
        }
    }

    async fn reject(&self, connection_id: &str, action: &str, error: &AppError) {
        let message = WebSocketMessage::action_rejected(action, error.to_string(), error.kind());
        self.broadcaster.send(connection_id, &message).await;
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, seat_id: &str, message: String) {
        debug!(connection_id = %connection_id, seat_id = %seat_id, message = %message, "Received message");

        let action = match ClientAction::parse(&message) {
            Ok(action) => action,
            Err(e) => {
                warn!(seat_id = %seat_id, error = %e, "Malformed action");
                let action = e.action().to_string();
                self.reject(connection_id, &action, &AppError::from(e)).await;
                return;
            }
        };

        let name = action.name();
        let result = match action {
            ClientAction::PlayCard(card) => self
                .game_service
                .play_card(seat_id, connection_id, card)
                .await,
            ClientAction::ChooseTrump(suit) => self
                .game_service
                .choose_trump(seat_id, connection_id, suit)
                .await
                .map(|_deal| ()),
            ClientAction::LeaveGame => self.room_service.leave(seat_id, connection_id).await,
        };

        if let Err(e) = result {
            warn!(seat_id = %seat_id, action = name, error = %e, "Action rejected");
            self.reject(connection_id, name, &e).await;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
    /// Room to join, if the client has one in mind.
    pub room: Option<String>,
    /// Display name for guests.
    pub name: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// WebSocket endpoint
/// GET /ws?room=<id>&name=<guest name>, with an optional bearer token in the
/// Authorization header or the `token` query parameter.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers).or(params.token.as_deref());
    let identity = state.identity.resolve(token, params.name.as_deref())?;

    info!(
        address = %addr,
        name = %identity.display_name,
        guest = identity.user_id.is_none(),
        "WebSocket connection requested"
    );
    let requested_room = params.room;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity, addr, requested_room)))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    identity: Identity,
    addr: SocketAddr,
    requested_room: Option<String>,
) {
    let connection_id = Uuid::new_v4().to_string();
    let connections = state.broadcaster.connections().clone();

    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    connections
        .add_connection(connection_id.clone(), outbound_sender)
        .await;
    state
        .broadcaster
        .send(&connection_id, &WebSocketMessage::connection_ack(connection_id.clone()))
        .await;

    let request = JoinRequest {
        name: identity.display_name,
        origin: Origin::new(identity.user_id, addr.ip().to_string()),
        connection_id: connection_id.clone(),
        requested_room,
    };
    let joined = match state.room_service.join(request).await {
        Ok(joined) => joined,
        Err(e) => {
            warn!(connection_id = %connection_id, error = %e, "Could not seat connection");
            connections.remove_connection(&connection_id).await;
            let _ = SocketWrapper::close(&mut socket).await;
            return;
        }
    };

    info!(
        connection_id = %connection_id,
        room_id = %joined.room_id,
        seat_id = %joined.seat_id,
        kind = ?joined.kind,
        "Connection seated"
    );

    let handler = Arc::new(WebsocketReceiveHandler::new(
        state.game_service.clone(),
        state.room_service.clone(),
        state.broadcaster.clone(),
    ));
    let connection = Connection::new(
        connection_id.clone(),
        joined.seat_id.clone(),
        Box::new(socket),
        outbound_receiver,
        handler,
    );

    match connection.run().await {
        Ok(()) => info!(connection_id = %connection_id, "WebSocket connection closed"),
        Err(e) => warn!(connection_id = %connection_id, error = %e, "WebSocket connection error"),
    }

    connections.remove_connection(&connection_id).await;
    state
        .room_service
        .disconnect(&joined.seat_id, &connection_id)
        .await;
}
