//! Default chunk renderer

use chunkflow_types::{Chunk, IntentType, UiState};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::{RenderRequest, ViewRenderer};
use crate::intent::{EntityType, IntentCandidate};

/// Builds one chunk per response from the intent and data, in the shape the
/// default contract maps the intent to. Extra chunks supplied by the data
/// source under `"chunks"` are appended in order.
#[derive(Debug, Clone, Default)]
pub struct DefaultRenderer;

impl ViewRenderer for DefaultRenderer {
    fn render_chunks(&self, request: &RenderRequest<'_>) -> Vec<Chunk> {
        let mut chunks = vec![primary_chunk(request)];
        chunks.extend(extra_chunks(request.data));
        chunks
    }
}

fn primary_chunk(request: &RenderRequest<'_>) -> Chunk {
    let RenderRequest { intent, state, data } = *request;

    match intent.intent_type {
        IntentType::EmailRead => list_view("Inbox", data),
        IntentType::EmailSearch => {
            let mut chunk = list_view("Search results", data);
            if let Some(query) = data.get("query") {
                chunk = chunk.with("query", query.clone());
            }
            chunk
        }
        IntentType::MeetingList => list_view("Upcoming meetings", data),
        IntentType::TaskList => list_view("Tasks", data),

        IntentType::EmailCompose => form_card(
            "New email",
            &[("to", "To"), ("subject", "Subject"), ("body", "Message")],
            "email.send",
            prefill(intent, &[(EntityType::Email, "to"), (EntityType::Contact, "to")]),
        ),
        IntentType::MeetingSchedule => form_card(
            "Schedule meeting",
            &[
                ("participants", "Participants"),
                ("date", "Date"),
                ("time", "Time"),
                ("agenda", "Agenda"),
            ],
            "meeting.book",
            prefill(
                intent,
                &[
                    (EntityType::Contact, "participants"),
                    (EntityType::Date, "date"),
                    (EntityType::Time, "time"),
                ],
            ),
        ),
        IntentType::TaskCreate => form_card(
            "New task",
            &[("title", "Title"), ("due", "Due"), ("priority", "Priority")],
            "task.create",
            prefill(intent, &[(EntityType::Date, "due"), (EntityType::Priority, "priority")]),
        ),

        IntentType::CalendarView => {
            let mut chunk = Chunk::new("CalendarView")
                .with("range", data.get("range").cloned().unwrap_or_else(|| json!("week")))
                .with("events", array_or_empty(data, "events"));
            if let Some(date) = intent.entity(EntityType::Date) {
                chunk = chunk.with("focusDate", date.value.clone());
            }
            chunk
        }

        IntentType::ContactLookup => {
            let name = data
                .get("name")
                .cloned()
                .or_else(|| {
                    intent
                        .entity(EntityType::Contact)
                        .map(|e| Value::String(e.value.clone()))
                })
                .unwrap_or_else(|| json!(""));
            let mut chunk = Chunk::new("ContactCard").with("name", name);
            for key in ["email", "phone", "company"] {
                if let Some(value) = data.get(key) {
                    chunk = chunk.with(key, value.clone());
                }
            }
            chunk
        }

        IntentType::AnalyticsView => Chunk::new("AggregatedCard")
            .with("title", "Analytics")
            .with("sources", array_or_empty(data, "sources"))
            .with("items", array_or_empty(data, "metrics")),

        IntentType::Settings => {
            let sections = data.get("sections").cloned().unwrap_or_else(|| {
                json!([
                    {"id": "notifications", "title": "Notifications"},
                    {"id": "account", "title": "Account"},
                    {"id": "appearance", "title": "Appearance"}
                ])
            });
            Chunk::new("SettingsPanel").with("sections", sections)
        }

        IntentType::Navigate | IntentType::NavigateBack => Chunk::new("NavigationCard")
            .with("title", view_title(state))
            .with("destination", state.as_str())
            .with("message", format!("Now viewing {}", view_title(state))),

        IntentType::GeneralQuery => text_block(
            data.get("answer")
                .and_then(Value::as_str)
                .unwrap_or("I'm not sure yet, but I can look into it."),
        ),
        IntentType::Unknown => text_block("I can help with email, meetings, tasks and more."),
    }
}

fn list_view(title: &str, data: &Value) -> Chunk {
    let items = array_or_empty(data, "items");
    let total = items.as_array().map_or(0, Vec::len);
    Chunk::new("ListView")
        .with("title", title)
        .with("items", items)
        .with("total", total)
        .with("emptyText", "Nothing here yet")
}

fn form_card(title: &str, fields: &[(&str, &str)], submit: &str, prefill: Map<String, Value>) -> Chunk {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(name, label)| json!({"name": name, "label": label}))
        .collect();
    let mut chunk = Chunk::new("FormCard")
        .with("title", title)
        .with("fields", fields)
        .with("submitAction", submit);
    if !prefill.is_empty() {
        chunk = chunk.with("prefill", prefill);
    }
    chunk
}

fn text_block(content: &str) -> Chunk {
    Chunk::new("TextBlock").with("content", content)
}

/// First entity of each type wins a form field
fn prefill(intent: &IntentCandidate, mapping: &[(EntityType, &str)]) -> Map<String, Value> {
    let mut prefill = Map::new();
    for (entity_type, field) in mapping {
        if prefill.contains_key(*field) {
            continue;
        }
        if let Some(entity) = intent.entity(*entity_type) {
            prefill.insert(field.to_string(), Value::String(entity.value.clone()));
        }
    }
    prefill
}

fn array_or_empty(data: &Value, key: &str) -> Value {
    data.get(key).cloned().unwrap_or_else(|| json!([]))
}

/// Chunks the data source produced itself; unparseable entries become
/// untyped chunks so the contract replaces them rather than losing a slot
fn extra_chunks(data: &Value) -> Vec<Chunk> {
    let Some(raw) = data.get("chunks").and_then(Value::as_array) else {
        return Vec::new();
    };
    raw.iter()
        .enumerate()
        .map(|(idx, value)| {
            serde_json::from_value::<Chunk>(value.clone()).unwrap_or_else(|err| {
                warn!(index = idx, error = %err, "Unparseable chunk from data source");
                Chunk::new("Unparseable")
            })
        })
        .collect()
}

/// Heading text for a view
pub fn view_title(state: UiState) -> &'static str {
    match state {
        UiState::Dashboard => "Dashboard",
        UiState::EmailInbox => "Inbox",
        UiState::EmailCompose => "Compose",
        UiState::EmailDetail => "Email",
        UiState::Calendar => "Calendar",
        UiState::MeetingList => "Meetings",
        UiState::MeetingDetail => "Meeting",
        UiState::MeetingBook => "Book a meeting",
        UiState::TaskBoard => "Task board",
        UiState::Analytics => "Analytics",
        UiState::Settings => "Settings",
        UiState::Chat => "Chat",
    }
}
