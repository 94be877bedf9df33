//! Intent Resolution Engine
//!
//! Resolves raw text into a typed intent with extracted entities, using the
//! versioned pattern table in `config/intents.yaml`.
//!
//! ```text
//! ExtractingEntities ──► DetectingCandidates ──► IntentResolved
//!         ▲                       │
//!         │                       ▼
//!         └── next input ── ClarificationRequired
//! ```
//!
//! Candidates are scored by the maximum confidence of any matching rule for
//! their intent. Selection accepts a strong, complete top candidate directly
//! and otherwise re-ranks with a boost for intents related to the last
//! resolved one.

mod clarify;
mod context;
mod engine;
mod entity;

pub use context::*;
pub use engine::*;
pub use entity::*;

use chunkflow_types::IntentType;
use serde::{Deserialize, Serialize};

/// Why a candidate cannot be acted on as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityType {
    /// Required entities are absent
    MissingInformation,
    /// Confidence below the clarification threshold
    LowConfidence,
    /// Top two candidates are within the match margin
    MultipleMatches,
    /// No intent matched well enough
    Unknown,
}

/// A scored hypothesis about what the user wants
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCandidate {
    pub intent_type: IntentType,
    pub confidence: f32,
    pub entities: Vec<Entity>,
    pub missing_entities: Vec<EntityType>,
    pub ambiguity_type: Option<AmbiguityType>,
    pub clarification_needed: bool,
    /// Text captured by the winning rule's `destination` group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Explainability trace only, never used for control flow
    pub reasoning: String,
}

impl IntentCandidate {
    pub fn entity(&self, entity_type: EntityType) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == entity_type)
    }

    pub fn has_entity(&self, entity_type: EntityType) -> bool {
        self.entity(entity_type).is_some()
    }
}

/// Conceptual stage of a resolution call, reported in traces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    ExtractingEntities,
    DetectingCandidates,
    ClarificationRequired,
    IntentResolved,
}

/// Outcome of resolving one input
#[derive(Debug, Clone, PartialEq)]
pub enum IntentDecision {
    Resolved(IntentCandidate),
    ClarificationRequired {
        candidate: IntentCandidate,
        questions: Vec<String>,
    },
}

impl IntentDecision {
    pub fn candidate(&self) -> &IntentCandidate {
        match self {
            IntentDecision::Resolved(candidate) => candidate,
            IntentDecision::ClarificationRequired { candidate, .. } => candidate,
        }
    }

    pub fn stage(&self) -> ResolutionStage {
        match self {
            IntentDecision::Resolved(_) => ResolutionStage::IntentResolved,
            IntentDecision::ClarificationRequired { .. } => ResolutionStage::ClarificationRequired,
        }
    }
}
