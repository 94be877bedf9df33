//! Session state

use chrono::{DateTime, Utc};
use chunkflow_types::UiState;
use std::sync::Arc;
use uuid::Uuid;

use crate::intent::ConversationContext;
use crate::navigation::{NavigationPolicy, StateMachine};

/// Everything mutable about one user's conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    state_machine: StateMachine,
    conversation: ConversationContext,
}

impl Session {
    pub fn new(
        policy: Arc<NavigationPolicy>,
        conversation_window: usize,
        user_id: Option<String>,
        tenant_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state_machine: StateMachine::new(policy),
            conversation: ConversationContext::new(conversation_window).with_ids(user_id, tenant_id),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.conversation.user_id.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.conversation.tenant_id.as_deref()
    }

    pub fn current_state(&self) -> UiState {
        self.state_machine.current()
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state_machine
    }

    pub fn state_machine_mut(&mut self) -> &mut StateMachine {
        &mut self.state_machine
    }

    pub fn conversation(&self) -> &ConversationContext {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut ConversationContext {
        &mut self.conversation
    }
}
