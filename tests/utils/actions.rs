#![allow(dead_code)]

use serde_json::json;
use tokio::time::{sleep, Duration};

use hokm::game::{Card, Phase, Suit};
use hokm::room::JoinedSeat;
use hokm::websockets::MessageHandler;

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a raw action as the player at `index` and wait for processing
    pub async fn send_raw(&self, index: usize, raw: &str) {
        let player = self.player(index);
        self.input_handler
            .handle_message(&player.connection_id, &player.seat_id, raw.to_string())
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    pub async fn play_card(&self, index: usize, card: Card) {
        let action = json!({ "action": "play_card", "data": card });
        self.send_raw(index, &action.to_string()).await;
    }

    /// Choose trump and wait for the remainder deal to finish
    pub async fn choose_trump(&self, index: usize, suit: Suit) {
        let action = json!({ "action": "choose_trump", "data": suit });
        self.send_raw(index, &action.to_string()).await;
        self.wait_for_phase(Phase::Playing).await;
        // the last batch is delivered just after the room lock is released
        sleep(Duration::from_millis(20)).await;
    }

    pub async fn leave(&self, index: usize) {
        self.send_raw(index, r#"{"action":"leave_game"}"#).await;
    }

    /// Drop the player's transport, as the session loop does on a read failure
    pub async fn disconnect(&self, index: usize) {
        let player = self.player(index);
        self.state
            .room_service
            .disconnect(&player.seat_id, &player.connection_id)
            .await;
    }

    /// New connection from the player's original address
    pub async fn reconnect(&self, index: usize, connection_id: &str) -> JoinedSeat {
        let player = self.player(index).clone();
        self.join_as(&player.name, &player.address, connection_id, None)
            .await
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    pub async fn phase(&self) -> Phase {
        self.room().await.lock().await.game.phase()
    }

    pub async fn wait_for_phase(&self, phase: Phase) {
        for _ in 0..100 {
            if self.phase().await == phase {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("room never reached {:?}", phase);
    }

    /// Seat index holding the trump-chooser role
    pub async fn chooser(&self) -> usize {
        self.room()
            .await
            .lock()
            .await
            .game
            .trump_chooser()
            .expect("a chooser should be selected")
    }
}
