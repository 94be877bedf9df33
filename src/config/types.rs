//! Serde shapes of the YAML rule tables

use chunkflow_types::{IntentType, UiState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::intent::{AmbiguityType, EntityType};

/// All three rule tables, loaded together
#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    pub navigation: NavigationConfig,
    pub intents: IntentsConfig,
    pub contract: ContractConfig,
}

// ============================================================================
// NAVIGATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub version: String,
    #[serde(default = "default_initial_state")]
    pub initial_state: UiState,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub direct_navigation: DirectNavigation,
    pub transitions: BTreeMap<UiState, Vec<UiState>>,
}

/// Switch for the direct-link override that bypasses the allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectNavigation {
    #[default]
    Enabled,
    Disabled,
}

fn default_initial_state() -> UiState {
    UiState::Dashboard
}

fn default_history_limit() -> usize {
    50
}

// ============================================================================
// INTENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentsConfig {
    pub version: String,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default = "default_conversation_window")]
    pub conversation_window: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    pub entity_patterns: Vec<EntityPatternConfig>,
    pub intents: Vec<IntentRuleConfig>,
    #[serde(default)]
    pub relation_sets: BTreeMap<String, Vec<IntentType>>,
    pub clarification: ClarificationConfig,
}

/// Confidence cut-offs used by detection and selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Below this a candidate needs clarification
    pub clarify_below: f32,
    /// At least one candidate must reach this or an unknown candidate is added
    pub candidate_floor: f32,
    /// Top candidate at or above this (and complete) is accepted without re-ranking
    pub direct_accept: f32,
    pub context_boost: f32,
    pub unknown_when_empty: f32,
    pub unknown_when_weak: f32,
    pub multiple_match_margin: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            clarify_below: 0.7,
            candidate_floor: 0.5,
            direct_accept: 0.8,
            context_boost: 0.1,
            unknown_when_empty: 0.1,
            unknown_when_weak: 0.3,
            multiple_match_margin: 0.1,
        }
    }
}

fn default_conversation_window() -> usize {
    10
}

fn default_max_questions() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPatternConfig {
    pub entity_type: EntityType,
    pub pattern: String,
    pub confidence: f32,
    /// Capture group holding the value; the whole match when absent
    #[serde(default)]
    pub group: Option<usize>,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Values that match the pattern but must not be extracted
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRuleConfig {
    pub intent: IntentType,
    pub rules: Vec<PatternRuleConfig>,
    #[serde(default)]
    pub relevant_entities: Vec<EntityType>,
    #[serde(default)]
    pub required_entities: Vec<EntityType>,
    /// View the resolved intent navigates to; none keeps the current view
    #[serde(default)]
    pub target_state: Option<UiState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRuleConfig {
    pub pattern: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationConfig {
    /// Missing-entity question per ambiguity type. `{intent}` and `{fields}`
    /// are substituted.
    pub templates: BTreeMap<AmbiguityType, String>,
    pub rephrase_prompt: String,
    pub capability_prompt: String,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub version: String,
    pub chunk_shapes: Vec<ChunkShapeConfig>,
    pub mappings: BTreeMap<IntentType, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkShapeConfig {
    pub chunk_type: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    #[serde(default)]
    pub predicates: Vec<String>,
}
