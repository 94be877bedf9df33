//! Orchestrator: resolve, navigate, render, enforce

use chunkflow_types::{
    AdjacencyList, Chunk, ChunkSeverity, ClarificationPayload, IntentType, StateInfo, UiState,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::session::Session;
use super::source::{DataRequest, ViewDataSource};
use crate::config::{ConfigLoader, CoreConfig};
use crate::contract::MappingContract;
use crate::error::{ConfigResult, PipelineResult};
use crate::intent::{IntentCandidate, IntentDecision, IntentEngine};
use crate::navigation::NavigationPolicy;
use crate::render::{build_view_graph, DefaultRenderer, RenderRequest, ViewRenderer};

/// Transitions included in every state-info payload
const RECENT_TRANSITIONS: usize = 5;

/// Result of processing one input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Ambiguous input; ask and wait for the next message
    Clarification(ClarificationPayload),
    /// The resolved intent asked for a view the allow-list forbids
    NavigationRejected(RejectedNavigation),
    Rendered(RenderedView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedNavigation {
    pub intent: IntentType,
    /// `None` when a rollback had nothing to return to
    pub requested: Option<UiState>,
    pub state: StateInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedView {
    pub intent: IntentType,
    pub confidence: f32,
    pub state: StateInfo,
    pub graph: AdjacencyList,
    /// Contract-checked chunks in render order
    pub chunks: Vec<Chunk>,
    /// Ordinals replaced by error chunks
    pub substituted: Vec<usize>,
}

/// A resolved intent whose navigation has been committed
struct CommittedView {
    candidate: IntentCandidate,
    state: UiState,
}

enum Step {
    Done(Outcome),
    Render(CommittedView),
}

/// Immutable pipeline shared by every session
pub struct Orchestrator {
    engine: IntentEngine,
    contract: MappingContract,
    navigation: Arc<NavigationPolicy>,
    renderer: Box<dyn ViewRenderer>,
}

impl Orchestrator {
    /// Validate every rule table and build the pipeline
    pub fn from_config(config: &CoreConfig) -> ConfigResult<Self> {
        Ok(Self {
            engine: IntentEngine::new(&config.intents)?,
            contract: MappingContract::new(&config.contract)?,
            navigation: Arc::new(NavigationPolicy::from_config(&config.navigation)?),
            renderer: Box::new(DefaultRenderer),
        })
    }

    /// Load from `CHUNKFLOW_CONFIG_DIR` or the embedded tables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_config(&ConfigLoader::from_env().load()?)
    }

    pub fn with_renderer(mut self, renderer: impl ViewRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn engine(&self) -> &IntentEngine {
        &self.engine
    }

    pub fn contract(&self) -> &MappingContract {
        &self.contract
    }

    pub fn new_session(&self, user_id: Option<&str>, tenant_id: Option<&str>) -> Session {
        Session::new(
            Arc::clone(&self.navigation),
            self.engine.conversation_window(),
            user_id.map(str::to_string),
            tenant_id.map(str::to_string),
        )
    }

    pub fn process(&self, session: &mut Session, text: &str) -> PipelineResult<Outcome> {
        self.process_with_data(session, text, &Value::Null)
    }

    /// Process with domain data already in hand
    pub fn process_with_data(
        &self,
        session: &mut Session,
        text: &str,
        data: &Value,
    ) -> PipelineResult<Outcome> {
        match self.decide(session, text) {
            Step::Done(outcome) => Ok(outcome),
            Step::Render(view) => {
                let chunks = self.render_chunks(&view, data);
                self.finish(session, view, chunks)
            }
        }
    }

    /// Process, fetching render data from `source` once navigation has
    /// committed. A failed fetch renders an error chunk in place of the view.
    pub async fn process_with_source(
        &self,
        session: &mut Session,
        text: &str,
        source: &dyn ViewDataSource,
    ) -> PipelineResult<Outcome> {
        let view = match self.decide(session, text) {
            Step::Done(outcome) => return Ok(outcome),
            Step::Render(view) => view,
        };

        let request = DataRequest {
            session_id: session.id,
            user_id: session.user_id().map(str::to_string),
            tenant_id: session.tenant_id().map(str::to_string),
            state: view.state,
            intent: view.candidate.intent_type,
            entities: view.candidate.entities.clone(),
        };
        let chunks = match source.fetch(&request).await {
            Ok(data) => self.render_chunks(&view, &data),
            Err(err) => {
                warn!(
                    session_id = %session.id,
                    state = %view.state,
                    error = %err,
                    "View data fetch failed"
                );
                vec![Chunk::error(
                    ChunkSeverity::Warning,
                    "Data unavailable",
                    format!("Could not load data for {}", view.state),
                )]
            }
        };
        self.finish(session, view, chunks)
    }

    /// Direct-link navigation to `to`, bypassing the allow-list
    pub fn navigate_direct(
        &self,
        session: &mut Session,
        to: UiState,
        data: &Value,
    ) -> PipelineResult<Outcome> {
        let user_id = session.user_id().map(str::to_string);
        if !session
            .state_machine_mut()
            .navigate_direct(to, None, user_id.as_deref())
        {
            return Ok(Outcome::NavigationRejected(RejectedNavigation {
                intent: IntentType::Navigate,
                requested: Some(to),
                state: session.state_machine().state_info(RECENT_TRANSITIONS),
            }));
        }

        let view = CommittedView {
            candidate: IntentCandidate {
                intent_type: IntentType::Navigate,
                confidence: 1.0,
                entities: Vec::new(),
                missing_entities: Vec::new(),
                ambiguity_type: None,
                clarification_needed: false,
                destination: Some(to.as_str().to_string()),
                reasoning: "direct navigation".to_string(),
            },
            state: to,
        };
        let chunks = self.render_chunks(&view, data);
        self.finish(session, view, chunks)
    }

    fn decide(&self, session: &mut Session, text: &str) -> Step {
        let decision = self.engine.resolve(text, session.conversation());

        let candidate = match decision {
            IntentDecision::ClarificationRequired {
                candidate,
                questions,
            } => {
                session.conversation_mut().set_pending(&candidate);
                info!(
                    session_id = %session.id,
                    intent = %candidate.intent_type,
                    confidence = candidate.confidence,
                    questions = questions.len(),
                    "Asking for clarification"
                );
                return Step::Done(Outcome::Clarification(ClarificationPayload {
                    questions,
                    candidate_intent: candidate.intent_type,
                    confidence: candidate.confidence,
                }));
            }
            IntentDecision::Resolved(candidate) => candidate,
        };

        session.conversation_mut().record_resolved(&candidate, text);
        info!(
            session_id = %session.id,
            intent = %candidate.intent_type,
            confidence = candidate.confidence,
            "Resolved intent"
        );

        let user_id = session.user_id().map(str::to_string);
        let machine = session.state_machine_mut();
        let current = machine.current();

        if candidate.intent_type == IntentType::NavigateBack {
            if !machine.rollback_to_previous() {
                return Step::Done(Outcome::NavigationRejected(RejectedNavigation {
                    intent: candidate.intent_type,
                    requested: None,
                    state: machine.state_info(RECENT_TRANSITIONS),
                }));
            }
            let state = machine.current();
            return Step::Render(CommittedView { candidate, state });
        }

        let target = match candidate.intent_type {
            IntentType::Navigate => candidate
                .destination
                .as_deref()
                .and_then(UiState::from_phrase),
            other => self.engine.target_state(other),
        }
        .unwrap_or(current);

        if target != current {
            let context = transition_context(&candidate);
            if !machine.transition_to(
                target,
                candidate.intent_type.as_str(),
                Some(context),
                user_id.as_deref(),
            ) {
                return Step::Done(Outcome::NavigationRejected(RejectedNavigation {
                    intent: candidate.intent_type,
                    requested: Some(target),
                    state: machine.state_info(RECENT_TRANSITIONS),
                }));
            }
        }

        Step::Render(CommittedView {
            candidate,
            state: target,
        })
    }

    fn render_chunks(&self, view: &CommittedView, data: &Value) -> Vec<Chunk> {
        self.renderer.render_chunks(&RenderRequest {
            intent: &view.candidate,
            state: view.state,
            data,
        })
    }

    fn finish(
        &self,
        session: &Session,
        view: CommittedView,
        chunks: Vec<Chunk>,
    ) -> PipelineResult<Outcome> {
        let intent = view.candidate.intent_type;
        let enforced = self.contract.enforce(intent, chunks);
        let graph = build_view_graph(view.state, &enforced.chunks)?;

        debug!(
            session_id = %session.id,
            state = %view.state,
            chunks = enforced.chunks.len(),
            substituted = enforced.substituted.len(),
            nodes = graph.len(),
            "Rendered view"
        );

        Ok(Outcome::Rendered(RenderedView {
            intent,
            confidence: view.candidate.confidence,
            state: session.state_machine().state_info(RECENT_TRANSITIONS),
            graph: graph.to_adjacency_list(),
            chunks: enforced.chunks,
            substituted: enforced.substituted,
        }))
    }
}

/// Context carried on the transition record and merged into the view's bag
fn transition_context(candidate: &IntentCandidate) -> Map<String, Value> {
    let mut entities = Map::new();
    for entity in &candidate.entities {
        entities
            .entry(entity.entity_type.as_str())
            .or_insert_with(|| Value::String(entity.value.clone()));
    }

    let mut context = Map::new();
    context.insert("intent".into(), json!(candidate.intent_type));
    context.insert("confidence".into(), json!(candidate.confidence));
    if !entities.is_empty() {
        context.insert("entities".into(), Value::Object(entities));
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    fn orchestrator() -> Orchestrator {
        Orchestrator::from_config(&ConfigLoader::embedded().load().unwrap()).unwrap()
    }

    fn rendered(outcome: Outcome) -> RenderedView {
        match outcome {
            Outcome::Rendered(view) => view,
            other => panic!("expected a rendered view, got {other:?}"),
        }
    }

    #[test]
    fn test_resolved_intent_navigates_and_renders() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(Some("u-1"), Some("t-1"));

        let view = rendered(orchestrator.process(&mut session, "check my email").unwrap());

        assert_eq!(view.intent, IntentType::EmailRead);
        assert_eq!(view.state.current_state, UiState::EmailInbox);
        assert_eq!(view.chunks[0].chunk_type, "ListView");
        assert!(view.substituted.is_empty());
        assert_eq!(view.graph.root_id.as_deref(), Some("root"));

        let last = session.state_machine().last_transition().unwrap();
        assert_eq!(last.action, "email_read");
        assert_eq!(last.user_id.as_deref(), Some("u-1"));
    }

    #[test]
    fn test_clarification_pauses_without_navigation() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(None, None);

        let outcome = orchestrator.process(&mut session, "schedule a meeting").unwrap();
        let Outcome::Clarification(payload) = outcome else {
            panic!("expected clarification");
        };
        assert_eq!(payload.candidate_intent, IntentType::MeetingSchedule);
        assert!(!payload.questions.is_empty());
        assert_eq!(session.current_state(), UiState::Dashboard);
        assert!(session.conversation().pending().is_some());
    }

    #[test]
    fn test_forbidden_navigation_is_reported() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(None, None);
        orchestrator.process(&mut session, "check my email").unwrap();

        let outcome = orchestrator.process(&mut session, "show analytics").unwrap();
        let Outcome::NavigationRejected(rejected) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(rejected.requested, Some(UiState::Analytics));
        assert_eq!(rejected.state.current_state, UiState::EmailInbox);
        assert!(rejected.state.available_transitions.contains(&UiState::Dashboard));
    }

    #[test]
    fn test_go_back_rolls_back() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(None, None);
        orchestrator.process(&mut session, "open settings").unwrap();
        assert_eq!(session.current_state(), UiState::Settings);

        let view = rendered(orchestrator.process(&mut session, "go back").unwrap());
        assert_eq!(view.intent, IntentType::NavigateBack);
        assert_eq!(view.state.current_state, UiState::Dashboard);
        assert_eq!(view.chunks[0].get("destination"), Some(&json!("dashboard")));
    }

    #[test]
    fn test_navigate_uses_the_named_view() {
        let orchestrator = orchestrator();
        let cases = [
            ("go to chat about my meetings", UiState::Chat),
            ("go to settings for my calendar", UiState::Settings),
            ("open the inbox from the dashboard", UiState::EmailInbox),
        ];
        for (text, expected) in cases {
            let mut session = orchestrator.new_session(None, None);
            let view = rendered(orchestrator.process(&mut session, text).unwrap());
            assert_eq!(view.intent, IntentType::Navigate, "{text}");
            assert_eq!(session.current_state(), expected, "{text}");
            assert_eq!(
                view.chunks[0].get("destination"),
                Some(&json!(expected.as_str())),
                "{text}"
            );
        }
    }

    #[test]
    fn test_direct_navigation_outcome() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(None, None);
        orchestrator.process(&mut session, "check my email").unwrap();

        let view = rendered(
            orchestrator
                .navigate_direct(&mut session, UiState::Analytics, &Value::Null)
                .unwrap(),
        );
        assert_eq!(view.state.current_state, UiState::Analytics);
        assert_eq!(
            session.state_machine().last_transition().unwrap().action,
            "api_navigation"
        );
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let orchestrator = orchestrator();
        let mut session = orchestrator.new_session(None, None);
        let outcome = orchestrator.process(&mut session, "schedule a meeting").unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "clarification");
        assert_eq!(json["candidateIntent"], "meeting_schedule");
    }
}
