//! Chunk-to-graph layout

use chunkflow_types::{Chunk, Props, UiState};
use serde_json::Value;

use super::chunks::view_title;
use crate::error::GraphResult;
use crate::graph::{ComponentGraph, ComponentKind, Direction, TypedProps};

/// Id of the root layout node of every view graph
pub const ROOT_NODE_ID: &str = "root";

/// Node kind for a chunk, plus the list field expanded into child nodes
fn layout_for(chunk_type: &str) -> (ComponentKind, Option<(&'static str, ComponentKind)>) {
    match chunk_type {
        "TextBlock" => (ComponentKind::TextBlock, None),
        "ListView" => (ComponentKind::List, Some(("items", ComponentKind::ListItem))),
        "AggregatedCard" => (ComponentKind::Card, Some(("items", ComponentKind::ListItem))),
        "FormCard" => (ComponentKind::Form, Some(("fields", ComponentKind::Field))),
        "CalendarView" => (
            ComponentKind::Custom("Calendar".into()),
            Some(("events", ComponentKind::ListItem)),
        ),
        "SettingsPanel" => (ComponentKind::List, Some(("sections", ComponentKind::ListItem))),
        "ContactCard" | "NavigationCard" | "ErrorBlock" => (ComponentKind::Card, None),
        other => (ComponentKind::Custom(other.to_string()), None),
    }
}

/// Build a fresh graph: root layout, a heading for the view, then one node
/// per chunk in chunk order.
pub fn build_view_graph(state: UiState, chunks: &[Chunk]) -> GraphResult<ComponentGraph> {
    let mut graph = ComponentGraph::new();
    let root = graph.add_node(
        ComponentKind::Layout,
        TypedProps::Layout {
            direction: Direction::Vertical,
            gap: Some(16),
        },
        Some(ROOT_NODE_ID),
    )?;
    graph.insert_node(
        &root,
        ComponentKind::TextBlock,
        TypedProps::TextBlock {
            content: view_title(state).to_string(),
            format: Some("heading".into()),
        },
        None,
    )?;

    for (ordinal, chunk) in chunks.iter().enumerate() {
        let (kind, expand) = layout_for(&chunk.chunk_type);

        let mut props = chunk.fields.clone();
        let children = expand.and_then(|(field, child_kind)| match props.remove(field) {
            Some(Value::Array(items)) => Some((items, child_kind)),
            Some(other) => {
                props.insert(field.to_string(), other);
                None
            }
            None => None,
        });
        props.insert("chunkType".into(), Value::String(chunk.chunk_type.clone()));
        props.insert("ordinal".into(), Value::from(ordinal));

        let node = graph.insert_node(&root, kind, props, None)?;
        if let Some((items, child_kind)) = children {
            for item in items {
                let props = match item {
                    Value::Object(map) => map,
                    other => {
                        let mut map = Props::new();
                        map.insert("value".into(), other);
                        map
                    }
                };
                graph.insert_node(&node, child_kind.clone(), props, None)?;
            }
        }
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkflow_types::{ChunkSeverity, Operation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_graph_preserves_chunk_order() {
        let chunks = vec![
            Chunk::new("TextBlock").with("content", "first"),
            Chunk::error(ChunkSeverity::Error, "Broken", "second"),
            Chunk::new("ListView")
                .with("title", "third")
                .with("items", json!([{"id": "a", "title": "A"}, "loose"])),
        ];

        let graph = build_view_graph(UiState::EmailInbox, &chunks).unwrap();
        let root_children = graph.children_of(ROOT_NODE_ID).unwrap();
        assert_eq!(root_children.len(), 4);

        let ordinals: Vec<Value> = root_children[1..]
            .iter()
            .map(|id| graph.get_node(id).unwrap().props["ordinal"].clone())
            .collect();
        assert_eq!(ordinals, vec![json!(0), json!(1), json!(2)]);

        let list = graph.get_node(&root_children[3]).unwrap();
        assert_eq!(list.kind, ComponentKind::List);
        assert!(list.props.get("items").is_none());
        assert_eq!(list.children.len(), 2);
        let loose = graph.get_node(&list.children[1]).unwrap();
        assert_eq!(loose.props["value"], json!("loose"));
    }

    #[test]
    fn test_operation_log_rebuilds_structure() {
        let chunks = vec![Chunk::new("TextBlock").with("content", "hi")];
        let graph = build_view_graph(UiState::Dashboard, &chunks).unwrap();

        let adjacency = graph.to_adjacency_list();
        assert_eq!(adjacency.root_id.as_deref(), Some(ROOT_NODE_ID));
        assert_eq!(adjacency.operations.len(), 3);
        for op in &adjacency.operations[1..] {
            match op {
                Operation::Insert { parent_id, .. } => {
                    assert_eq!(parent_id.as_deref(), Some(ROOT_NODE_ID))
                }
                other => panic!("unexpected operation {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_chunk_type_renders_as_passthrough() {
        let chunks = vec![Chunk::new("WeatherWidget").with("city", "Oslo")];
        let graph = build_view_graph(UiState::Chat, &chunks).unwrap();
        let tree = graph.to_tree();
        assert_eq!(tree["children"][1]["type"], json!("Passthrough"));
        assert_eq!(tree["children"][1]["originalType"], json!("WeatherWidget"));
    }
}
