//! Chunk shapes and the intent mapping table

use chunkflow_types::{Chunk, ChunkSeverity, IntentType, ERROR_CHUNK_TYPE};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

use super::predicate::Predicate;
use crate::config::{ChunkShapeConfig, ContractConfig};
use crate::error::{ConfigError, ConfigResult};

/// Declared shape of one chunk type
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkShape {
    pub chunk_type: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub predicates: Vec<Predicate>,
}

impl ChunkShape {
    fn from_config(def: &ChunkShapeConfig) -> ConfigResult<Self> {
        let predicates = def
            .predicates
            .iter()
            .map(|text| text.parse::<Predicate>())
            .collect::<ConfigResult<Vec<_>>>()?;

        let declared: BTreeSet<&str> = def
            .required
            .iter()
            .chain(&def.optional)
            .map(String::as_str)
            .collect();
        if let Some(stray) = predicates.iter().find(|p| !declared.contains(p.field())) {
            return Err(ConfigError::Invalid(format!(
                "predicate '{}' on {} checks undeclared field '{}'",
                stray,
                def.chunk_type,
                stray.field()
            )));
        }

        Ok(Self {
            chunk_type: def.chunk_type.clone(),
            required: def.required.clone(),
            optional: def.optional.clone(),
            predicates,
        })
    }

    /// The built-in error chunk: severity, title, message
    pub fn error_block() -> Self {
        Self {
            chunk_type: ERROR_CHUNK_TYPE.to_string(),
            required: vec!["severity".into(), "title".into(), "message".into()],
            optional: vec![],
            predicates: vec![
                Predicate::OneOf {
                    field: "severity".into(),
                    values: vec!["info".into(), "warning".into(), "error".into()],
                },
                Predicate::NonEmptyString("title".into()),
            ],
        }
    }

    fn violations(&self, chunk: &Chunk) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .required
            .iter()
            .filter(|field| !chunk.fields.contains_key(field.as_str()))
            .map(|field| Violation::MissingField(field.clone()))
            .collect();

        violations.extend(
            self.predicates
                .iter()
                .filter(|p| !p.check(&chunk.fields))
                .map(|p| Violation::PredicateFailed(p.to_string())),
        );
        violations
    }
}

/// Why a chunk failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("unknown chunk shape '{0}'")]
    UnknownShape(String),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("predicate failed: {0}")]
    PredicateFailed(String),

    #[error("intent {intent} may emit {expected}, not {actual}")]
    WrongShapeForIntent {
        intent: IntentType,
        expected: String,
        actual: String,
    },
}

/// Result of enforcing the contract over a response
#[derive(Debug, Clone, PartialEq)]
pub struct EnforcedOutput {
    /// Same length and order as the input
    pub chunks: Vec<Chunk>,
    /// Positions that were replaced by an error chunk
    pub substituted: Vec<usize>,
}

impl EnforcedOutput {
    pub fn is_clean(&self) -> bool {
        self.substituted.is_empty()
    }
}

/// Complete intent → chunk shape table. Construction fails unless every
/// intent type is covered by a declared shape.
#[derive(Debug, Clone)]
pub struct MappingContract {
    shapes: BTreeMap<String, ChunkShape>,
    mappings: BTreeMap<IntentType, String>,
}

impl MappingContract {
    pub fn new(config: &ContractConfig) -> ConfigResult<Self> {
        let mut shapes = BTreeMap::new();
        shapes.insert(ERROR_CHUNK_TYPE.to_string(), ChunkShape::error_block());

        for def in &config.chunk_shapes {
            if shapes.contains_key(&def.chunk_type) {
                return Err(ConfigError::DuplicateChunkShape(def.chunk_type.clone()));
            }
            shapes.insert(def.chunk_type.clone(), ChunkShape::from_config(def)?);
        }

        for intent in IntentType::ALL {
            let Some(chunk_type) = config.mappings.get(&intent) else {
                return Err(ConfigError::MissingMapping(intent));
            };
            if !shapes.contains_key(chunk_type) {
                return Err(ConfigError::UndeclaredChunkType {
                    intent,
                    chunk_type: chunk_type.clone(),
                });
            }
        }

        Ok(Self {
            shapes,
            mappings: config.mappings.clone(),
        })
    }

    /// Chunk type the intent may emit
    pub fn allowed_chunk_type(&self, intent: IntentType) -> Option<&str> {
        self.mappings.get(&intent).map(String::as_str)
    }

    pub fn shape(&self, chunk_type: &str) -> Option<&ChunkShape> {
        self.shapes.get(chunk_type)
    }

    /// Shape rules for the chunk's own type tag
    pub fn check_chunk(&self, chunk: &Chunk) -> Result<(), Vec<Violation>> {
        let Some(shape) = self.shapes.get(&chunk.chunk_type) else {
            return Err(vec![Violation::UnknownShape(chunk.chunk_type.clone())]);
        };
        let violations = shape.violations(chunk);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn validate_chunk(&self, chunk: &Chunk) -> bool {
        self.check_chunk(chunk).is_ok()
    }

    /// Vacuously true for no chunks
    pub fn validate_output(&self, chunks: &[Chunk]) -> bool {
        chunks.iter().all(|chunk| self.validate_chunk(chunk))
    }

    /// Shape rules plus the intent's mapping. Error chunks are always allowed.
    pub fn check_for_intent(&self, intent: IntentType, chunk: &Chunk) -> Result<(), Vec<Violation>> {
        if !chunk.is_error() {
            if let Some(expected) = self.allowed_chunk_type(intent) {
                if expected != chunk.chunk_type {
                    return Err(vec![Violation::WrongShapeForIntent {
                        intent,
                        expected: expected.to_string(),
                        actual: chunk.chunk_type.clone(),
                    }]);
                }
            }
        }
        self.check_chunk(chunk)
    }

    /// Replace every invalid chunk in place with an error chunk
    pub fn enforce(&self, intent: IntentType, chunks: Vec<Chunk>) -> EnforcedOutput {
        substitute(chunks, |chunk| self.check_for_intent(intent, chunk), Some(intent))
    }

    /// Shape-only enforcement for chunks with no producing intent
    pub fn enforce_shapes(&self, chunks: Vec<Chunk>) -> EnforcedOutput {
        substitute(chunks, |chunk| self.check_chunk(chunk), None)
    }
}

fn substitute<F>(chunks: Vec<Chunk>, check: F, intent: Option<IntentType>) -> EnforcedOutput
where
    F: Fn(&Chunk) -> Result<(), Vec<Violation>>,
{
    let mut substituted = Vec::new();
    let chunks = chunks
        .into_iter()
        .enumerate()
        .map(|(ordinal, chunk)| match check(&chunk) {
            Ok(()) => chunk,
            Err(violations) => {
                let reasons = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(
                    intent = ?intent,
                    ordinal,
                    chunk_type = %chunk.chunk_type,
                    violations = %reasons,
                    "Chunk failed contract validation"
                );
                substituted.push(ordinal);
                Chunk::error(
                    ChunkSeverity::Error,
                    "Content unavailable",
                    format!("{} chunk was rejected: {}", chunk.chunk_type, reasons),
                )
            }
        })
        .collect();

    EnforcedOutput { chunks, substituted }
}
