//! Conversation context carried between inputs of one session

use chrono::{DateTime, Utc};
use chunkflow_types::IntentType;
use serde::Serialize;
use std::collections::VecDeque;

use super::entity::Entity;
use super::IntentCandidate;

/// Summary of one resolved input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub intent: IntentType,
    pub confidence: f32,
    pub utterance: String,
    pub timestamp: DateTime<Utc>,
}

/// The candidate a clarification question was asked about
#[derive(Debug, Clone, PartialEq)]
pub struct PendingClarification {
    pub intent: IntentType,
    pub confidence: f32,
    pub entities: Vec<Entity>,
}

/// Rolling conversation history plus the open clarification, if any
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    turns: VecDeque<ConversationTurn>,
    window: usize,
    pending: Option<PendingClarification>,
}

impl ConversationContext {
    pub fn new(window: usize) -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            turns: VecDeque::new(),
            window,
            pending: None,
        }
    }

    pub fn with_ids(mut self, user_id: Option<String>, tenant_id: Option<String>) -> Self {
        self.user_id = user_id;
        self.tenant_id = tenant_id;
        self
    }

    /// Append the resolved intent and close any open clarification
    pub fn record_resolved(&mut self, candidate: &IntentCandidate, utterance: &str) {
        self.turns.push_back(ConversationTurn {
            intent: candidate.intent_type,
            confidence: candidate.confidence,
            utterance: utterance.to_string(),
            timestamp: Utc::now(),
        });
        while self.turns.len() > self.window {
            self.turns.pop_front();
        }
        self.pending = None;
    }

    pub fn set_pending(&mut self, candidate: &IntentCandidate) {
        self.pending = Some(PendingClarification {
            intent: candidate.intent_type,
            confidence: candidate.confidence,
            entities: candidate.entities.clone(),
        });
    }

    pub fn pending(&self) -> Option<&PendingClarification> {
        self.pending.as_ref()
    }

    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    pub fn last_resolved_intent(&self) -> Option<IntentType> {
        self.turns.back().map(|turn| turn.intent)
    }

    /// Oldest first
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(10)
    }
}
