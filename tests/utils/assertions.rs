//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use hokm::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<String>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let connections = setup
            .players
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        Self { setup, connections }
    }

    /// Create an assertion for the players at the given seat indices
    pub fn for_players(setup: &'a TestSetup, indices: &[usize]) -> Self {
        let connections = indices
            .iter()
            .map(|i| setup.player(*i).connection_id.clone())
            .collect();
        Self { setup, connections }
    }

    pub fn for_connection(setup: &'a TestSetup, connection_id: &str) -> Self {
        Self {
            setup,
            connections: vec![connection_id.to_string()],
        }
    }

    /// Assert that every connection's next message has this type (consumes it).
    /// Broadcast payloads must be identical; per-recipient types are exempt.
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            let raw = message.unwrap_or_else(|| panic!("{} should have received a message", connection));

            let msg: WebSocketMessage = serde_json::from_str(&raw).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                connection
            );
            messages.push(msg);
        }

        let per_recipient = matches!(
            expected_type,
            MessageType::GameUpdate | MessageType::JoinRoom | MessageType::ChooseTrump
        );
        if messages.len() > 1 && !per_recipient {
            let first_payload = &messages[0].payload;
            for (i, msg) in messages.iter().enumerate().skip(1) {
                assert_eq!(
                    &msg.payload, first_payload,
                    "{} payload differs from {}",
                    self.connections[i], self.connections[0]
                );
            }
        }

        MessageContent {
            payload: messages[0].payload.clone(),
        }
    }

    /// Assert that connections received no messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self.setup.mock_conn_manager.get_messages_for(connection).await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }

    /// Count how many messages of a specific type a connection received (non-consuming)
    pub async fn count_message_type(&self, connection: &str, msg_type: MessageType) -> usize {
        self.setup
            .mock_conn_manager
            .get_messages_for(connection)
            .await
            .iter()
            .filter_map(|raw| serde_json::from_str::<WebSocketMessage>(raw).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }

    /// First message of a type a connection received, without consuming anything
    pub async fn find(&self, connection: &str, msg_type: MessageType) -> Option<MessageContent> {
        self.setup
            .mock_conn_manager
            .get_messages_for(connection)
            .await
            .iter()
            .filter_map(|raw| serde_json::from_str::<WebSocketMessage>(raw).ok())
            .find(|msg| msg.message_type == msg_type)
            .map(|msg| MessageContent {
                payload: msg.payload,
            })
    }

    /// Assert that every connection received exactly these message types, in order
    pub async fn received_message_sequence(self, expected_types: Vec<MessageType>) {
        for connection in &self.connections {
            let types: Vec<MessageType> = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await
                .iter()
                .map(|raw| {
                    serde_json::from_str::<WebSocketMessage>(raw)
                        .unwrap_or_else(|e| panic!("Failed to parse message for {}: {}", connection, e))
                        .message_type
                })
                .collect();
            assert_eq!(types, expected_types, "{} message sequence", connection);
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    pub payload: serde_json::Value,
}

impl MessageContent {
    pub fn with_field(self, field: &str, expected: serde_json::Value) -> Self {
        assert_eq!(self.payload[field], expected, "payload field {}", field);
        self
    }

    pub fn with_seat_index(self, expected: usize) -> Self {
        assert_eq!(self.payload["seat_index"], expected);
        self
    }

    pub fn with_card_count(self, field: &str, expected: usize) -> Self {
        let cards = self.payload[field]
            .as_array()
            .unwrap_or_else(|| panic!("payload field {} is not a list", field));
        assert_eq!(cards.len(), expected, "cards in {}", field);
        self
    }
}
