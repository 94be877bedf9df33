//! Shared wire types for chunkflow
//!
//! This crate is the SINGLE SOURCE OF TRUTH for every type that crosses the
//! boundary of the orchestration core: the adjacency-list graph payload, the
//! state-info payload, the clarification payload and the chunk envelope.
//!
//! ## Rules
//!
//! 1. All boundary types live here - the core crate never defines its own DTOs
//! 2. JSON field names are camelCase
//! 3. Enum tags are snake_case strings (`"email_inbox"`, `"meeting_schedule"`)

pub mod chunk;
pub mod clarification;
pub mod graph;
pub mod state;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use chunk::*;
pub use clarification::*;
pub use graph::*;
pub use state::*;

// ============================================================================
// UI STATES
// ============================================================================

/// Named application views. The process-wide current value lives in the
/// state machine of each session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Dashboard,
    EmailInbox,
    EmailCompose,
    EmailDetail,
    Calendar,
    MeetingList,
    MeetingDetail,
    MeetingBook,
    TaskBoard,
    Analytics,
    Settings,
    Chat,
}

impl UiState {
    pub const ALL: [UiState; 12] = [
        UiState::Dashboard,
        UiState::EmailInbox,
        UiState::EmailCompose,
        UiState::EmailDetail,
        UiState::Calendar,
        UiState::MeetingList,
        UiState::MeetingDetail,
        UiState::MeetingBook,
        UiState::TaskBoard,
        UiState::Analytics,
        UiState::Settings,
        UiState::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Dashboard => "dashboard",
            UiState::EmailInbox => "email_inbox",
            UiState::EmailCompose => "email_compose",
            UiState::EmailDetail => "email_detail",
            UiState::Calendar => "calendar",
            UiState::MeetingList => "meeting_list",
            UiState::MeetingDetail => "meeting_detail",
            UiState::MeetingBook => "meeting_book",
            UiState::TaskBoard => "task_board",
            UiState::Analytics => "analytics",
            UiState::Settings => "settings",
            UiState::Chat => "chat",
        }
    }

    /// Map a free-text view phrase ("inbox", "task board") to a state.
    ///
    /// Longer phrases are tried first so "email compose" wins over "email".
    pub fn from_phrase(phrase: &str) -> Option<UiState> {
        const PHRASES: &[(&str, UiState)] = &[
            ("meeting details", UiState::MeetingDetail),
            ("meeting detail", UiState::MeetingDetail),
            ("book a meeting", UiState::MeetingBook),
            ("email compose", UiState::EmailCompose),
            ("email detail", UiState::EmailDetail),
            ("task board", UiState::TaskBoard),
            ("meetings", UiState::MeetingList),
            ("dashboard", UiState::Dashboard),
            ("analytics", UiState::Analytics),
            ("calendar", UiState::Calendar),
            ("settings", UiState::Settings),
            ("compose", UiState::EmailCompose),
            ("inbox", UiState::EmailInbox),
            ("tasks", UiState::TaskBoard),
            ("home", UiState::Dashboard),
            ("chat", UiState::Chat),
        ];

        let lowered = phrase
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if let Ok(state) = lowered.parse::<UiState>() {
            return Some(state);
        }
        PHRASES
            .iter()
            .find(|(needle, _)| lowered.contains(needle))
            .map(|(_, state)| *state)
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UiState {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UiState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "ui state",
                name: s.to_string(),
            })
    }
}

// ============================================================================
// INTENT TYPES
// ============================================================================

/// The closed set of intents the resolution engine can produce.
///
/// Adding a capability means adding a variant here, a rule block in the
/// intent table and a mapping rule in the chunk contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    EmailRead,
    EmailCompose,
    EmailSearch,
    MeetingSchedule,
    MeetingList,
    CalendarView,
    TaskCreate,
    TaskList,
    ContactLookup,
    AnalyticsView,
    Settings,
    Navigate,
    NavigateBack,
    GeneralQuery,
    Unknown,
}

impl IntentType {
    pub const ALL: [IntentType; 15] = [
        IntentType::EmailRead,
        IntentType::EmailCompose,
        IntentType::EmailSearch,
        IntentType::MeetingSchedule,
        IntentType::MeetingList,
        IntentType::CalendarView,
        IntentType::TaskCreate,
        IntentType::TaskList,
        IntentType::ContactLookup,
        IntentType::AnalyticsView,
        IntentType::Settings,
        IntentType::Navigate,
        IntentType::NavigateBack,
        IntentType::GeneralQuery,
        IntentType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::EmailRead => "email_read",
            IntentType::EmailCompose => "email_compose",
            IntentType::EmailSearch => "email_search",
            IntentType::MeetingSchedule => "meeting_schedule",
            IntentType::MeetingList => "meeting_list",
            IntentType::CalendarView => "calendar_view",
            IntentType::TaskCreate => "task_create",
            IntentType::TaskList => "task_list",
            IntentType::ContactLookup => "contact_lookup",
            IntentType::AnalyticsView => "analytics_view",
            IntentType::Settings => "settings",
            IntentType::Navigate => "navigate",
            IntentType::NavigateBack => "navigate_back",
            IntentType::GeneralQuery => "general_query",
            IntentType::Unknown => "unknown",
        }
    }

    /// Human phrasing used inside clarification questions
    pub fn describe(&self) -> &'static str {
        match self {
            IntentType::EmailRead => "read your email",
            IntentType::EmailCompose => "write an email",
            IntentType::EmailSearch => "search your email",
            IntentType::MeetingSchedule => "schedule a meeting",
            IntentType::MeetingList => "list your meetings",
            IntentType::CalendarView => "open your calendar",
            IntentType::TaskCreate => "create a task",
            IntentType::TaskList => "show your tasks",
            IntentType::ContactLookup => "look up a contact",
            IntentType::AnalyticsView => "show analytics",
            IntentType::Settings => "change settings",
            IntentType::Navigate => "navigate",
            IntentType::NavigateBack => "go back",
            IntentType::GeneralQuery => "answer a question",
            IntentType::Unknown => "help",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentType::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| UnknownName {
                kind: "intent type",
                name: s.to_string(),
            })
    }
}

/// Parse failure for the closed name sets above
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.name)
    }
}

impl std::error::Error for UnknownName {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ui_state_round_trips_through_str() {
        for state in UiState::ALL {
            assert_eq!(state.as_str().parse::<UiState>().unwrap(), state);
        }
    }

    #[test]
    fn test_ui_state_serializes_snake_case() {
        let json = serde_json::to_string(&UiState::EmailInbox).unwrap();
        assert_eq!(json, "\"email_inbox\"");
    }

    #[test]
    fn test_from_phrase_prefers_longer_match() {
        assert_eq!(UiState::from_phrase("the task board"), Some(UiState::TaskBoard));
        assert_eq!(UiState::from_phrase("Inbox"), Some(UiState::EmailInbox));
        assert_eq!(UiState::from_phrase("meeting details"), Some(UiState::MeetingDetail));
        assert_eq!(UiState::from_phrase("nowhere"), None);
        assert_eq!(UiState::from_phrase("Task\n  Board"), Some(UiState::TaskBoard));
    }

    #[test]
    fn test_unknown_intent_name_fails() {
        let err = "fly_to_moon".parse::<IntentType>().unwrap_err();
        assert_eq!(err.kind, "intent type");
        assert!(err.to_string().contains("fly_to_moon"));
    }
}
