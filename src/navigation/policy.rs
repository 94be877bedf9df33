//! Transition allow-list and navigation policy

use chunkflow_types::UiState;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{DirectNavigation, NavigationConfig};
use crate::error::{ConfigError, ConfigResult};

/// Directed allow-list of view transitions. Not necessarily symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    allowed: BTreeMap<UiState, BTreeSet<UiState>>,
}

impl TransitionTable {
    /// Every state must be listed, even when it has no outgoing edges
    pub fn from_config(transitions: &BTreeMap<UiState, Vec<UiState>>) -> ConfigResult<Self> {
        if let Some(missing) = UiState::ALL.iter().find(|s| !transitions.contains_key(s)) {
            return Err(ConfigError::Invalid(format!(
                "navigation allow-list has no entry for state '{}'",
                missing
            )));
        }

        let mut allowed = BTreeMap::new();
        for (from, targets) in transitions {
            if targets.contains(from) {
                return Err(ConfigError::Invalid(format!(
                    "state '{}' lists itself as a transition target",
                    from
                )));
            }
            allowed.insert(*from, targets.iter().copied().collect());
        }
        Ok(Self { allowed })
    }

    pub fn can_transition(&self, from: UiState, to: UiState) -> bool {
        self.allowed
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    pub fn targets(&self, from: UiState) -> BTreeSet<UiState> {
        self.allowed.get(&from).cloned().unwrap_or_default()
    }
}

/// Validated, immutable navigation settings shared by every session
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPolicy {
    pub table: TransitionTable,
    pub initial_state: UiState,
    pub history_limit: usize,
    pub direct_navigation: DirectNavigation,
}

impl NavigationPolicy {
    pub fn from_config(config: &NavigationConfig) -> ConfigResult<Self> {
        if config.history_limit < 2 {
            return Err(ConfigError::Invalid(format!(
                "history_limit must be at least 2 to allow rollback, got {}",
                config.history_limit
            )));
        }

        Ok(Self {
            table: TransitionTable::from_config(&config.transitions)?,
            initial_state: config.initial_state,
            history_limit: config.history_limit,
            direct_navigation: config.direct_navigation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use pretty_assertions::assert_eq;

    fn table() -> TransitionTable {
        let config = ConfigLoader::embedded().load_navigation().unwrap();
        TransitionTable::from_config(&config.transitions).unwrap()
    }

    #[test]
    fn test_email_detail_targets_are_exact() {
        let targets: Vec<UiState> = table().targets(UiState::EmailDetail).into_iter().collect();
        assert_eq!(
            targets,
            vec![UiState::Dashboard, UiState::EmailInbox, UiState::EmailCompose]
        );
    }

    #[test]
    fn test_allow_list_is_directed() {
        let table = table();
        assert!(table.can_transition(UiState::Chat, UiState::Analytics));
        assert!(!table.can_transition(UiState::Analytics, UiState::Chat));
        assert!(!table.can_transition(UiState::EmailInbox, UiState::Analytics));
        assert!(!table.can_transition(UiState::EmailDetail, UiState::Analytics));
    }

    #[test]
    fn test_every_state_can_reach_dashboard() {
        let table = table();
        for state in UiState::ALL {
            if state != UiState::Dashboard {
                assert!(table.can_transition(state, UiState::Dashboard), "{state}");
            }
        }
    }

    #[test]
    fn test_missing_state_is_config_error() {
        let mut transitions = BTreeMap::new();
        transitions.insert(UiState::Dashboard, vec![UiState::Chat]);
        let err = TransitionTable::from_config(&transitions).unwrap_err();
        assert!(err.to_string().contains("email_inbox"));
    }

    #[test]
    fn test_history_limit_too_small() {
        let mut config = ConfigLoader::embedded().load_navigation().unwrap();
        config.history_limit = 1;
        assert!(NavigationPolicy::from_config(&config).is_err());
    }
}
