//! Navigation state payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::UiState;

/// Immutable record of one accepted transition.
///
/// Created by the state machine on every accepted `transition_to`, every
/// rollback and every direct navigation override. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    pub id: Uuid,
    pub from_state: UiState,
    pub to_state: UiState,
    /// Free-text trigger name ("user_action", "rollback", "api_navigation")
    pub action: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl StateTransition {
    pub fn new(
        from_state: UiState,
        to_state: UiState,
        action: impl Into<String>,
        context: Map<String, Value>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_state,
            to_state,
            action: action.into(),
            context,
            timestamp: Utc::now(),
            user_id,
        }
    }
}

/// State-info payload returned to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInfo {
    pub current_state: UiState,
    pub available_transitions: Vec<UiState>,
    pub history_size: usize,
    pub recent_transitions: Vec<StateTransition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_serializes_camel_case() {
        let t = StateTransition::new(
            UiState::Dashboard,
            UiState::EmailInbox,
            "user_action",
            Map::new(),
            None,
        );
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["fromState"], "dashboard");
        assert_eq!(json["toState"], "email_inbox");
        assert!(json.get("userId").is_none());
    }
}
