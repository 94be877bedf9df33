//! Per-session UI state machine

use chunkflow_types::{StateInfo, StateTransition, UiState};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{info, warn};

use super::policy::NavigationPolicy;
use crate::config::DirectNavigation;

/// Action tag of the record every fresh machine starts with
pub const INITIALIZE_ACTION: &str = "initialize";
/// Action tag of rollback records
pub const ROLLBACK_ACTION: &str = "rollback";
/// Action tag of direct-link overrides
pub const API_NAVIGATION_ACTION: &str = "api_navigation";

/// Validates and records transitions between views for one session.
///
/// History is bounded by the policy's `history_limit`; the oldest record is
/// evicted first. Context passed with a transition is merged key-by-key into
/// the target view's context bag.
#[derive(Debug, Clone)]
pub struct StateMachine {
    policy: Arc<NavigationPolicy>,
    current: UiState,
    history: VecDeque<StateTransition>,
    contexts: HashMap<UiState, Map<String, Value>>,
}

impl StateMachine {
    pub fn new(policy: Arc<NavigationPolicy>) -> Self {
        let initial = policy.initial_state;
        let mut machine = Self {
            policy,
            current: initial,
            history: VecDeque::new(),
            contexts: HashMap::new(),
        };
        machine.commit(StateTransition::new(
            initial,
            initial,
            INITIALIZE_ACTION,
            Map::new(),
            None,
        ));
        machine
    }

    pub fn current(&self) -> UiState {
        self.current
    }

    pub fn can_transition(&self, from: UiState, to: UiState) -> bool {
        self.policy.table.can_transition(from, to)
    }

    /// Move to `to` if the allow-list permits it from the current view.
    ///
    /// Returns false and leaves every field untouched when rejected.
    pub fn transition_to(
        &mut self,
        to: UiState,
        action: &str,
        context: Option<Map<String, Value>>,
        user_id: Option<&str>,
    ) -> bool {
        let from = self.current;
        if !self.can_transition(from, to) {
            warn!(
                from = %from,
                to = %to,
                action,
                "Rejected state transition"
            );
            return false;
        }

        let record = StateTransition::new(
            from,
            to,
            action,
            context.unwrap_or_default(),
            user_id.map(str::to_string),
        );
        self.commit(record);
        info!(from = %from, to = %to, action, "State transition");
        true
    }

    /// Return to the view that was current before the latest transition.
    ///
    /// Appends a `rollback` record rather than truncating history. Returns
    /// false when fewer than two records exist.
    pub fn rollback_to_previous(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        let Some(previous) = self.history.get(self.history.len() - 2) else {
            return false;
        };
        let target = previous.to_state;
        let from = self.current;

        let mut context = Map::new();
        if let Some(last) = self.history.back() {
            context.insert("rolledBack".into(), Value::String(last.id.to_string()));
        }

        self.commit(StateTransition::new(from, target, ROLLBACK_ACTION, context, None));
        info!(from = %from, to = %target, "Rolled back state");
        true
    }

    /// Force the current view for direct-link navigation.
    ///
    /// Bypasses the allow-list and is tagged `api_navigation`. Returns false
    /// only when direct navigation is disabled in configuration.
    pub fn navigate_direct(
        &mut self,
        to: UiState,
        context: Option<Map<String, Value>>,
        user_id: Option<&str>,
    ) -> bool {
        let from = self.current;
        if self.policy.direct_navigation == DirectNavigation::Disabled {
            warn!(from = %from, to = %to, "Direct navigation disabled");
            return false;
        }

        let record = StateTransition::new(
            from,
            to,
            API_NAVIGATION_ACTION,
            context.unwrap_or_default(),
            user_id.map(str::to_string),
        );
        self.commit(record);
        warn!(
            from = %from,
            to = %to,
            allowed = self.can_transition(from, to),
            "Direct navigation override"
        );
        true
    }

    pub fn available_transitions(&self) -> BTreeSet<UiState> {
        self.policy.table.targets(self.current)
    }

    /// Oldest first
    pub fn history(&self) -> impl Iterator<Item = &StateTransition> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.history.back()
    }

    /// Context accumulated for a view across every transition into it
    pub fn context_for(&self, state: UiState) -> Option<&Map<String, Value>> {
        self.contexts.get(&state)
    }

    /// State-info payload with the `recent` most recent records, oldest first
    pub fn state_info(&self, recent: usize) -> StateInfo {
        let skip = self.history.len().saturating_sub(recent);
        StateInfo {
            current_state: self.current,
            available_transitions: self.available_transitions().into_iter().collect(),
            history_size: self.history.len(),
            recent_transitions: self.history.iter().skip(skip).cloned().collect(),
        }
    }

    // Record append, eviction, context merge and the state change happen
    // together; nothing in here can fail. Rollback context is audit data and
    // stays on the record only.
    fn commit(&mut self, record: StateTransition) {
        let to = record.to_state;
        if record.action != ROLLBACK_ACTION {
            let bag = self.contexts.entry(to).or_default();
            for (key, value) in &record.context {
                bag.insert(key.clone(), value.clone());
            }
        }

        self.history.push_back(record);
        while self.history.len() > self.policy.history_limit {
            self.history.pop_front();
        }
        self.current = to;
    }
}
