use serde::Deserialize;
use serde_json::Value;

use crate::game::{Card, Suit};

/// Raw inbound envelope: `{"action": "...", "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEnvelope {
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    PlayCard(Card),
    ChooseTrump(Suit),
    LeaveGame,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Message is not an action envelope: {0}")]
    MalformedEnvelope(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Malformed payload for {action}: {reason}")]
    MalformedPayload { action: String, reason: String },
}

impl ActionError {
    /// Action name to report back, if one could be read.
    pub fn action(&self) -> &str {
        match self {
            ActionError::MalformedEnvelope(_) => "unknown",
            ActionError::UnknownAction(action) => action,
            ActionError::MalformedPayload { action, .. } => action,
        }
    }
}

impl ClientAction {
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let envelope: ActionEnvelope = serde_json::from_str(raw)
            .map_err(|e| ActionError::MalformedEnvelope(e.to_string()))?;
        Self::try_from(envelope)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientAction::PlayCard(_) => "play_card",
            ClientAction::ChooseTrump(_) => "choose_trump",
            ClientAction::LeaveGame => "leave_game",
        }
    }
}

impl TryFrom<ActionEnvelope> for ClientAction {
    type Error = ActionError;

    fn try_from(envelope: ActionEnvelope) -> Result<Self, Self::Error> {
        let malformed = |reason: String| ActionError::MalformedPayload {
            action: envelope.action.clone(),
            reason,
        };

        match envelope.action.as_str() {
            "play_card" => serde_json::from_value::<Card>(envelope.data.clone())
                .map(ClientAction::PlayCard)
                .map_err(|e| malformed(e.to_string())),
            "choose_trump" => match &envelope.data {
                Value::String(suit) => Suit::try_from(suit.as_str())
                    .map(ClientAction::ChooseTrump)
                    .map_err(|e| malformed(e.to_string())),
                other => Err(malformed(format!("expected a suit string, got {}", other))),
            },
            "leave_game" => Ok(ClientAction::LeaveGame),
            other => Err(ActionError::UnknownAction(other.to_string())),
        }
    }
}
