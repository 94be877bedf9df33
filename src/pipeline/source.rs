//! Data-source adapter seam
//!
//! The only place the pipeline suspends. Domain data (emails, meetings,
//! metrics) is fetched after the transition commits and before rendering;
//! the core treats it as opaque JSON.

use chunkflow_types::{IntentType, UiState};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::intent::Entity;

/// What the renderer is about to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    pub session_id: Uuid,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub state: UiState,
    pub intent: IntentType,
    pub entities: Vec<Entity>,
}

#[async_trait::async_trait]
pub trait ViewDataSource: Send + Sync {
    async fn fetch(&self, request: &DataRequest) -> anyhow::Result<Value>;
}

/// Fixed data keyed by intent, then by view. Returns `Null` otherwise.
#[derive(Debug, Clone, Default)]
pub struct StaticDataSource {
    by_intent: HashMap<IntentType, Value>,
    by_state: HashMap<UiState, Value>,
}

impl StaticDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intent(mut self, intent: IntentType, data: Value) -> Self {
        self.by_intent.insert(intent, data);
        self
    }

    pub fn with_state(mut self, state: UiState, data: Value) -> Self {
        self.by_state.insert(state, data);
        self
    }
}

#[async_trait::async_trait]
impl ViewDataSource for StaticDataSource {
    async fn fetch(&self, request: &DataRequest) -> anyhow::Result<Value> {
        Ok(self
            .by_intent
            .get(&request.intent)
            .or_else(|| self.by_state.get(&request.state))
            .cloned()
            .unwrap_or(Value::Null))
    }
}
