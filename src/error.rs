//! Error types for the orchestration core
//!
//! Only two failure classes are errors here: structural graph misuse and
//! configuration problems. Rejected navigation, ambiguity and contract
//! violations are ordinary outcomes and never surface as `Err`.

use chunkflow_types::IntentType;
use thiserror::Error;

/// Structural errors raised by the component graph
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Cannot attach {child} under {parent}: would create a cycle")]
    CycleDetected { parent: String, child: String },

    #[error("Node cannot be its own child: {0}")]
    SelfReference(String),
}

/// Result type for graph mutations
pub type GraphResult<T> = Result<T, GraphError>;

/// Fatal configuration problems, detected before any request is served
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No mapping rule for intent: {0}")]
    MissingMapping(IntentType),

    #[error("Intent {intent} maps to undeclared chunk type '{chunk_type}'")]
    UndeclaredChunkType {
        intent: IntentType,
        chunk_type: String,
    },

    #[error("Chunk type '{0}' is declared more than once")]
    DuplicateChunkShape(String),

    #[error("Cannot parse predicate '{0}'")]
    InvalidPredicate(String),

    #[error("Invalid pattern for {owner}: {source}")]
    InvalidPattern {
        owner: String,
        #[source]
        source: regex::Error,
    },

    #[error("Confidence {value} for {owner} is outside 0.0..=1.0")]
    InvalidConfidence { owner: String, value: f32 },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// IO and YAML failures, including unknown state or intent names
    #[error("Failed to load configuration: {0:#}")]
    Load(#[from] anyhow::Error),
}

/// Result type for configuration loading and validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the orchestration pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
