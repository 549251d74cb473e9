#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hokm::{
    config::{RulesConfig, ServerConfig, TimingConfig},
    history::InMemoryMatchHistoryRepository,
    room::{models::Origin, JoinRequest, JoinedSeat, RoomHandle},
    AppState, WebsocketReceiveHandler,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
pub struct TestPlayer {
    pub name: String,
    pub connection_id: String,
    pub seat_id: String,
    pub address: String,
}

pub struct TestSetup {
    pub state: AppState,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub history: Arc<InMemoryMatchHistoryRepository>,
    pub input_handler: WebsocketReceiveHandler,
    /// Players in seat-index order for the first room.
    pub players: Vec<TestPlayer>,
    pub room_id: String,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    rules: RulesConfig,
    reconnect_grace: Duration,
    cross_room_replacement: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            rules: RulesConfig::default(),
            reconnect_grace: Duration::from_secs(30),
            cross_room_replacement: true,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["arash", "bahar"])
    }

    pub fn with_four_players(self) -> Self {
        self.with_players(vec!["arash", "bahar", "cyrus", "darya"])
    }

    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_reconnect_grace(mut self, grace: Duration) -> Self {
        self.reconnect_grace = grace;
        self
    }

    pub fn without_cross_room_replacement(mut self) -> Self {
        self.cross_room_replacement = false;
        self
    }

    /// Seats every player, in order, and waits for the opening deal if the
    /// room fills up.
    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let history = Arc::new(InMemoryMatchHistoryRepository::new());
        let config = ServerConfig {
            rules: self.rules,
            timing: TimingConfig::immediate(self.reconnect_grace),
            cross_room_replacement: self.cross_room_replacement,
            ..ServerConfig::default()
        };
        let state = AppState::new(config, mock_conn_manager.clone(), history.clone());
        let input_handler = WebsocketReceiveHandler::new(
            state.game_service.clone(),
            state.room_service.clone(),
            state.broadcaster.clone(),
        );

        let mut setup = TestSetup {
            state,
            mock_conn_manager,
            history,
            input_handler,
            players: vec![],
            room_id: String::new(),
        };

        for (i, name) in self.players.iter().enumerate() {
            let address = format!("10.0.0.{}", i + 1);
            let connection_id = format!("conn-{}", name);
            let joined = setup
                .join_as(name, &address, &connection_id, None)
                .await;
            setup.room_id = joined.room_id.clone();
            setup.players.push(TestPlayer {
                name: name.clone(),
                connection_id,
                seat_id: joined.seat_id,
                address,
            });
        }

        setup
    }
}

impl TestSetup {
    /// Joins through the room service, waiting for any match start it triggers.
    pub async fn join_as(
        &self,
        name: &str,
        address: &str,
        connection_id: &str,
        requested_room: Option<&str>,
    ) -> JoinedSeat {
        let mut joined = self
            .state
            .room_service
            .join(JoinRequest {
                name: name.to_string(),
                origin: Origin::new(None, address),
                connection_id: connection_id.to_string(),
                requested_room: requested_room.map(str::to_string),
            })
            .await
            .expect("join should succeed");
        if let Some(start) = joined.match_start.take() {
            start.await.expect("match start task panicked");
        }
        joined
    }

    pub fn player(&self, index: usize) -> &TestPlayer {
        &self.players[index]
    }

    pub async fn room(&self) -> RoomHandle {
        self.state
            .registry
            .get_room(&self.room_id)
            .await
            .expect("room should exist")
    }
}
