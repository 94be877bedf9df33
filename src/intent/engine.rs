//! Candidate detection and selection

use chunkflow_types::{IntentType, UiState};
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use super::clarify::Clarifier;
use super::context::ConversationContext;
use super::entity::{Entity, EntityExtractor, EntityType};
use super::{AmbiguityType, IntentCandidate, IntentDecision, ResolutionStage};
use crate::config::{IntentRuleConfig, IntentsConfig, Thresholds};
use crate::error::{ConfigError, ConfigResult};

/// Conjunctions that separate independent requests in one utterance
static COMPOUND_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s+and\s+then\s+|,?\s+and\s+also\s+|,?\s+and\s+|\s+also\s+|\s+then\s+|;\s*")
        .unwrap()
});

struct CompiledIntentRule {
    intent: IntentType,
    patterns: Vec<(Regex, f32)>,
    relevant: Vec<EntityType>,
    required: Vec<EntityType>,
    target_state: Option<UiState>,
}

/// Capture group naming the view a navigation rule points at
const DESTINATION_GROUP: &str = "destination";

/// Strongest rule match for one intent
struct RuleMatch {
    confidence: f32,
    destination: Option<String>,
}

impl CompiledIntentRule {
    /// Highest confidence of any matching pattern; the earlier rule wins ties
    fn best_match(&self, text: &str) -> Option<RuleMatch> {
        let mut best: Option<RuleMatch> = None;
        for (regex, confidence) in &self.patterns {
            let Some(caps) = regex.captures(text) else {
                continue;
            };
            if best.as_ref().is_some_and(|b| b.confidence >= *confidence) {
                continue;
            }
            best = Some(RuleMatch {
                confidence: *confidence,
                destination: caps
                    .name(DESTINATION_GROUP)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|d| !d.is_empty()),
            });
        }
        best
    }
}

/// Pattern-table intent resolver. Immutable once built; shared by sessions.
pub struct IntentEngine {
    extractor: EntityExtractor,
    rules: Vec<CompiledIntentRule>,
    relation_sets: Vec<(String, BTreeSet<IntentType>)>,
    thresholds: Thresholds,
    clarifier: Clarifier,
    conversation_window: usize,
}

impl IntentEngine {
    pub fn new(config: &IntentsConfig) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(config.intents.len());
        for def in &config.intents {
            if def.intent == IntentType::Unknown {
                return Err(ConfigError::Invalid(
                    "the unknown intent is synthesized and cannot declare rules".into(),
                ));
            }
            if !seen.insert(def.intent) {
                return Err(ConfigError::Invalid(format!(
                    "intent '{}' has more than one rule block",
                    def.intent
                )));
            }
            rules.push(Self::compile_rule(def)?);
        }

        if let Some(missing) = IntentType::ALL
            .iter()
            .find(|intent| **intent != IntentType::Unknown && !seen.contains(*intent))
        {
            return Err(ConfigError::Invalid(format!(
                "intent '{}' has no rule block",
                missing
            )));
        }

        let mut grouped = HashSet::new();
        let mut relation_sets = Vec::new();
        for (name, members) in &config.relation_sets {
            for intent in members {
                if !grouped.insert(*intent) {
                    return Err(ConfigError::Invalid(format!(
                        "intent '{}' appears in more than one relation set",
                        intent
                    )));
                }
            }
            relation_sets.push((name.clone(), members.iter().copied().collect()));
        }

        Ok(Self {
            extractor: EntityExtractor::new(&config.entity_patterns)?,
            rules,
            relation_sets,
            thresholds: config.thresholds,
            clarifier: Clarifier::new(&config.clarification, config.max_questions)?,
            conversation_window: config.conversation_window,
        })
    }

    fn compile_rule(def: &IntentRuleConfig) -> ConfigResult<CompiledIntentRule> {
        let owner = format!("intent '{}'", def.intent);
        let mut patterns = Vec::with_capacity(def.rules.len());
        for rule in &def.rules {
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(ConfigError::InvalidConfidence {
                    owner,
                    value: rule.confidence,
                });
            }
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidPattern {
                    owner: owner.clone(),
                    source,
                })?;
            patterns.push((regex, rule.confidence));
        }

        // Required entities are always relevant
        let mut relevant = def.relevant_entities.clone();
        for required in &def.required_entities {
            if !relevant.contains(required) {
                relevant.push(*required);
            }
        }

        Ok(CompiledIntentRule {
            intent: def.intent,
            patterns,
            relevant,
            required: def.required_entities.clone(),
            target_state: def.target_state,
        })
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Size of the rolling history a session should keep
    pub fn conversation_window(&self) -> usize {
        self.conversation_window
    }

    /// View the intent navigates to when resolved, if any
    pub fn target_state(&self, intent: IntentType) -> Option<UiState> {
        self.rules
            .iter()
            .find(|rule| rule.intent == intent)
            .and_then(|rule| rule.target_state)
    }

    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        self.extractor.extract(text)
    }

    /// Score every intent against `text`, strongest first.
    ///
    /// When nothing reaches the candidate floor an `unknown` candidate is
    /// prepended. An open clarification in `context` is continued when the
    /// new input does not start a different request of its own.
    pub fn detect_candidates(
        &self,
        text: &str,
        entities: &[Entity],
        context: &ConversationContext,
    ) -> Vec<IntentCandidate> {
        let mut candidates: Vec<IntentCandidate> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let RuleMatch {
                    confidence,
                    destination,
                } = rule.best_match(text)?;
                let reasoning = format!("matched {} pattern at {:.2}", rule.intent, confidence);
                Some(self.build_candidate(rule, confidence, entities, destination, reasoning))
            })
            .collect();

        if let Some(pending) = context.pending() {
            let competing = candidates.iter().any(|c| {
                c.intent_type != pending.intent && c.confidence >= self.thresholds.candidate_floor
            });
            if !competing {
                if let Some(rule) = self.rules.iter().find(|r| r.intent == pending.intent) {
                    // New entities first so a corrected value wins
                    let mut merged = entities.to_vec();
                    for entity in &pending.entities {
                        if !merged.iter().any(|e| e.entity_type == entity.entity_type) {
                            merged.push(entity.clone());
                        }
                    }
                    let own_idx = candidates
                        .iter()
                        .position(|c| c.intent_type == pending.intent);
                    let own = own_idx.map(|idx| candidates.remove(idx));
                    let confidence = own
                        .as_ref()
                        .map_or(pending.confidence, |c| c.confidence.max(pending.confidence));
                    let destination = own.and_then(|c| c.destination);
                    let reasoning = format!(
                        "continues clarification for {} at {:.2}",
                        pending.intent, confidence
                    );
                    candidates.push(self.build_candidate(
                        rule,
                        confidence,
                        &merged,
                        destination,
                        reasoning,
                    ));
                }
            }
        }

        sort_by_confidence(&mut candidates);

        let floor = self.thresholds.candidate_floor;
        if !candidates.iter().any(|c| c.confidence >= floor) {
            let confidence = if candidates.is_empty() {
                self.thresholds.unknown_when_empty
            } else {
                self.thresholds.unknown_when_weak
            };
            let reasoning = format!(
                "no candidate reached {:.2} ({} weak)",
                floor,
                candidates.len()
            );
            candidates.insert(0, self.unknown_candidate(confidence, reasoning));
        } else {
            self.tag_multiple_matches(&mut candidates);
        }

        debug!(
            stage = ?ResolutionStage::DetectingCandidates,
            candidates = candidates.len(),
            top = %candidates[0].intent_type,
            confidence = candidates[0].confidence,
            "Detected intent candidates"
        );
        candidates
    }

    /// Pick the candidate to act on.
    ///
    /// A strong, complete top candidate is returned as-is. Otherwise every
    /// candidate related to the last resolved intent gets the context boost
    /// and the list is re-ranked.
    pub fn select_best(
        &self,
        mut candidates: Vec<IntentCandidate>,
        context: &ConversationContext,
    ) -> IntentCandidate {
        let Some(top) = candidates.first() else {
            return self.unknown_candidate(
                self.thresholds.unknown_when_empty,
                "no candidates".to_string(),
            );
        };
        if top.confidence >= self.thresholds.direct_accept && !top.clarification_needed {
            return candidates.swap_remove(0);
        }

        if let Some(last) = context.last_resolved_intent() {
            if let Some((set_name, members)) = self.relation_set(last) {
                for candidate in candidates
                    .iter_mut()
                    .filter(|c| members.contains(&c.intent_type))
                {
                    candidate.confidence =
                        (candidate.confidence + self.thresholds.context_boost).min(1.0);
                    candidate.reasoning.push_str(&format!(
                        "; boosted to {:.2} by recent {} intent {}",
                        candidate.confidence, set_name, last
                    ));
                    candidate.clarification_needed = !candidate.missing_entities.is_empty()
                        || candidate.confidence < self.thresholds.clarify_below;
                    candidate.ambiguity_type = self.classify(
                        candidate.intent_type,
                        candidate.confidence,
                        &candidate.missing_entities,
                    );
                }
                sort_by_confidence(&mut candidates);
                self.tag_multiple_matches(&mut candidates);
            }
        }

        candidates.swap_remove(0)
    }

    /// At most `max_questions`, missing-entity questions first
    pub fn generate_clarification_questions(&self, candidate: &IntentCandidate) -> Vec<String> {
        self.clarifier
            .questions(candidate, self.thresholds.clarify_below)
    }

    /// Extract, detect, select and decide for one input
    pub fn resolve(&self, text: &str, context: &ConversationContext) -> IntentDecision {
        debug!(stage = ?ResolutionStage::ExtractingEntities, "Resolving input");
        let entities = self.extract_entities(text);
        let candidates = self.detect_candidates(text, &entities, context);
        let best = self.select_best(candidates, context);

        if best.clarification_needed {
            let questions = self.generate_clarification_questions(&best);
            debug!(
                stage = ?ResolutionStage::ClarificationRequired,
                intent = %best.intent_type,
                confidence = best.confidence,
                missing = best.missing_entities.len(),
                "Clarification required"
            );
            IntentDecision::ClarificationRequired {
                candidate: best,
                questions,
            }
        } else {
            debug!(
                stage = ?ResolutionStage::IntentResolved,
                intent = %best.intent_type,
                confidence = best.confidence,
                "Intent resolved"
            );
            IntentDecision::Resolved(best)
        }
    }

    /// Split "check my inbox and then open the calendar" into independent
    /// requests. Returns the whole text when any part would be a single word.
    pub fn split_compound(text: &str) -> Vec<String> {
        let segments: Vec<String> = COMPOUND_SPLIT_RE
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if segments.len() > 1 && segments.iter().all(|s| s.split_whitespace().count() >= 2) {
            segments
        } else {
            vec![text.trim().to_string()]
        }
    }

    fn build_candidate(
        &self,
        rule: &CompiledIntentRule,
        confidence: f32,
        entities: &[Entity],
        destination: Option<String>,
        reasoning: String,
    ) -> IntentCandidate {
        let attached: Vec<Entity> = entities
            .iter()
            .filter(|e| rule.relevant.contains(&e.entity_type))
            .cloned()
            .collect();
        let missing: Vec<EntityType> = rule
            .required
            .iter()
            .copied()
            .filter(|required| !attached.iter().any(|e| e.entity_type == *required))
            .collect();

        IntentCandidate {
            intent_type: rule.intent,
            confidence,
            clarification_needed: !missing.is_empty()
                || confidence < self.thresholds.clarify_below,
            ambiguity_type: self.classify(rule.intent, confidence, &missing),
            entities: attached,
            missing_entities: missing,
            destination,
            reasoning,
        }
    }

    fn unknown_candidate(&self, confidence: f32, reasoning: String) -> IntentCandidate {
        IntentCandidate {
            intent_type: IntentType::Unknown,
            confidence,
            entities: Vec::new(),
            missing_entities: Vec::new(),
            ambiguity_type: Some(AmbiguityType::Unknown),
            clarification_needed: true,
            destination: None,
            reasoning,
        }
    }

    fn classify(
        &self,
        intent: IntentType,
        confidence: f32,
        missing: &[EntityType],
    ) -> Option<AmbiguityType> {
        let low = confidence < self.thresholds.clarify_below;
        if intent == IntentType::Unknown {
            Some(AmbiguityType::Unknown)
        } else if !missing.is_empty() && low {
            Some(AmbiguityType::LowConfidence)
        } else if !missing.is_empty() {
            Some(AmbiguityType::MissingInformation)
        } else if low {
            Some(AmbiguityType::LowConfidence)
        } else {
            None
        }
    }

    /// Mark the top candidate when the runner-up is within the match margin.
    /// Tags left by an earlier ranking are reclassified first.
    fn tag_multiple_matches(&self, candidates: &mut [IntentCandidate]) {
        for candidate in candidates.iter_mut() {
            if candidate.ambiguity_type == Some(AmbiguityType::MultipleMatches) {
                candidate.ambiguity_type = self.classify(
                    candidate.intent_type,
                    candidate.confidence,
                    &candidate.missing_entities,
                );
            }
        }

        let [top, runner_up, ..] = candidates else {
            return;
        };
        let close = top.confidence - runner_up.confidence
            <= self.thresholds.multiple_match_margin + f32::EPSILON;
        if close
            && matches!(
                top.ambiguity_type,
                None | Some(AmbiguityType::MissingInformation)
            )
        {
            top.ambiguity_type = Some(AmbiguityType::MultipleMatches);
        }
    }

    fn relation_set(&self, intent: IntentType) -> Option<(&str, &BTreeSet<IntentType>)> {
        self.relation_sets
            .iter()
            .find(|(_, members)| members.contains(&intent))
            .map(|(name, members)| (name.as_str(), members))
    }
}

/// Descending by confidence; ties keep table order
fn sort_by_confidence(candidates: &mut [IntentCandidate]) {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}
