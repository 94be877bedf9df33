//! Clarification question templates

use chunkflow_types::IntentType;
use std::collections::BTreeMap;

use super::{AmbiguityType, EntityType, IntentCandidate};
use crate::config::ClarificationConfig;
use crate::error::{ConfigError, ConfigResult};

pub(crate) struct Clarifier {
    templates: BTreeMap<AmbiguityType, String>,
    rephrase_prompt: String,
    capability_prompt: String,
    max_questions: usize,
}

impl Clarifier {
    pub(crate) fn new(config: &ClarificationConfig, max_questions: usize) -> ConfigResult<Self> {
        if !config.templates.contains_key(&AmbiguityType::MissingInformation) {
            return Err(ConfigError::Invalid(
                "clarification templates must include missing_information".into(),
            ));
        }
        if max_questions == 0 {
            return Err(ConfigError::Invalid("max_questions must be at least 1".into()));
        }

        Ok(Self {
            templates: config.templates.clone(),
            rephrase_prompt: config.rephrase_prompt.clone(),
            capability_prompt: config.capability_prompt.clone(),
            max_questions,
        })
    }

    /// Missing-entity question first, then the rephrase prompt for low
    /// confidence, then the capability prompt for unknown input.
    pub(crate) fn questions(&self, candidate: &IntentCandidate, clarify_below: f32) -> Vec<String> {
        let mut questions = Vec::new();

        if !candidate.missing_entities.is_empty() {
            let template = candidate
                .ambiguity_type
                .and_then(|kind| self.templates.get(&kind))
                .or_else(|| self.templates.get(&AmbiguityType::MissingInformation));
            if let Some(template) = template {
                questions.push(
                    template
                        .replace("{intent}", candidate.intent_type.describe())
                        .replace("{fields}", &join_fields(&candidate.missing_entities)),
                );
            }
        }

        if candidate.confidence < clarify_below {
            questions.push(self.rephrase_prompt.clone());
        }

        if candidate.intent_type == IntentType::Unknown {
            questions.push(self.capability_prompt.clone());
        }

        questions.truncate(self.max_questions);
        questions
    }
}

/// "date", "date and time", "date, time and participant"
fn join_fields(fields: &[EntityType]) -> String {
    let labels: Vec<&str> = fields.iter().map(EntityType::label).collect();
    match labels.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
