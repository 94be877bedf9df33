//! Entity Extractor
//!
//! Applies the ordered, typed patterns from the intent table across the whole
//! input. Matches of the same type that repeat a value (case-insensitively)
//! or overlap an earlier match are dropped; the first occurrence wins.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::config::EntityPatternConfig;
use crate::error::{ConfigError, ConfigResult};

/// Typed entity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Email,
    Phone,
    Date,
    Time,
    /// A person referenced by name ("with Sarah", "to John Smith")
    Contact,
    Priority,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Email => "email",
            EntityType::Phone => "phone",
            EntityType::Date => "date",
            EntityType::Time => "time",
            EntityType::Contact => "contact",
            EntityType::Priority => "priority",
        }
    }

    /// Field name used in clarification questions
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Email => "email address",
            EntityType::Phone => "phone number",
            EntityType::Date => "date",
            EntityType::Time => "time",
            EntityType::Contact => "participant",
            EntityType::Priority => "priority",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed, positioned match. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_type: EntityType,
    /// Raw matched text
    pub value: String,
    pub confidence: f32,
    /// Character offset of the first matched character
    pub start: usize,
    /// Character offset one past the last matched character
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Entity {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

struct CompiledEntityPattern {
    entity_type: EntityType,
    regex: Regex,
    confidence: f32,
    group: Option<usize>,
    exclude: Vec<String>,
}

pub struct EntityExtractor {
    patterns: Vec<CompiledEntityPattern>,
}

impl EntityExtractor {
    pub fn new(patterns: &[EntityPatternConfig]) -> ConfigResult<Self> {
        let patterns = patterns
            .iter()
            .map(Self::compile_pattern)
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    fn compile_pattern(def: &EntityPatternConfig) -> ConfigResult<CompiledEntityPattern> {
        let owner = format!("entity pattern '{}'", def.entity_type);
        if !(0.0..=1.0).contains(&def.confidence) {
            return Err(ConfigError::InvalidConfidence {
                owner,
                value: def.confidence,
            });
        }

        let regex = RegexBuilder::new(&def.pattern)
            .case_insensitive(!def.case_sensitive)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                owner: owner.clone(),
                source,
            })?;

        if let Some(group) = def.group {
            if group >= regex.captures_len() {
                return Err(ConfigError::Invalid(format!(
                    "{} has no capture group {}",
                    owner, group
                )));
            }
        }

        Ok(CompiledEntityPattern {
            entity_type: def.entity_type,
            regex,
            confidence: def.confidence,
            group: def.group,
            exclude: def.exclude.iter().map(|v| v.to_lowercase()).collect(),
        })
    }

    /// Extract entities in pattern order, then by position within a pattern
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let Some(matched) = (match pattern.group {
                    Some(group) => caps.get(group),
                    None => Some(whole),
                }) else {
                    continue;
                };

                let value = matched.as_str().trim();
                if value.is_empty() {
                    continue;
                }
                let lowered = value.to_lowercase();
                if pattern.exclude.contains(&lowered) {
                    continue;
                }

                let start = char_offset(text, matched.start());
                let end = start + matched.as_str().trim_end().chars().count();
                let duplicate = entities.iter().any(|e| {
                    e.entity_type == pattern.entity_type
                        && (e.value.to_lowercase() == lowered || e.overlaps(start, end))
                });
                if duplicate {
                    continue;
                }

                let metadata = pattern.group.map(|_| {
                    let mut meta = Map::new();
                    meta.insert("matched".into(), Value::String(whole.as_str().to_string()));
                    meta
                });

                entities.push(Entity {
                    entity_type: pattern.entity_type,
                    value: value.to_string(),
                    confidence: pattern.confidence,
                    start,
                    end,
                    metadata,
                });
            }
        }

        entities
    }
}

/// Offsets are reported in characters, not UTF-8 bytes
fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    fn extractor() -> EntityExtractor {
        let config = ConfigLoader::embedded().load_intents().unwrap();
        EntityExtractor::new(&config.entity_patterns).unwrap()
    }

    fn types(entities: &[Entity]) -> Vec<EntityType> {
        entities.iter().map(|e| e.entity_type).collect()
    }

    #[test]
    fn test_bare_email_address() {
        let entities = extractor().extract("test@example.com");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_type, EntityType::Email);
        assert_eq!(entities[0].value, "test@example.com");
        assert_eq!((entities[0].start, entities[0].end), (0, 16));
    }

    #[test]
    fn test_meeting_request_entities() {
        let entities = extractor().extract("Schedule a meeting with Sarah Connor tomorrow at 3pm");
        assert_eq!(
            types(&entities),
            vec![EntityType::Date, EntityType::Time, EntityType::Contact]
        );
        let contact = entities.iter().find(|e| e.entity_type == EntityType::Contact).unwrap();
        assert_eq!(contact.value, "Sarah Connor");
        assert_eq!(contact.metadata.as_ref().unwrap()["matched"], "with Sarah Connor");
    }

    #[test]
    fn test_offsets_count_characters() {
        let entities = extractor().extract("Meet with Zoë tomorrow");
        assert_eq!(types(&entities), vec![EntityType::Date, EntityType::Contact]);
        assert_eq!((entities[0].start, entities[0].end), (14, 22));
        assert_eq!(entities[1].value, "Zoë");
        assert_eq!((entities[1].start, entities[1].end), (10, 13));
    }

    #[test]
    fn test_weekday_is_not_a_contact() {
        let entities = extractor().extract("move it to Friday");
        assert_eq!(types(&entities), vec![EntityType::Date]);
    }

    #[test]
    fn test_duplicate_values_keep_first() {
        let entities = extractor().extract("email BOB@x.io and bob@x.io");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].value, "BOB@x.io");
    }

    #[test]
    fn test_phone_and_priority() {
        let entities = extractor().extract("urgent: call 555-123-4567");
        assert_eq!(types(&entities), vec![EntityType::Phone, EntityType::Priority]);
        assert_eq!(entities[0].value, "555-123-4567");
    }

    #[test]
    fn test_bad_pattern_is_config_error() {
        let def = EntityPatternConfig {
            entity_type: EntityType::Date,
            pattern: "(unclosed".into(),
            confidence: 0.5,
            group: None,
            case_sensitive: false,
            exclude: vec![],
        };
        assert!(matches!(
            EntityExtractor::new(&[def]),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
