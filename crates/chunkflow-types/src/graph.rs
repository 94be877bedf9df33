//! Component graph wire format
//!
//! The adjacency list is what the core hands to renderers:
//!
//! ```text
//! { nodes: { id -> {id, type, props, children} }, rootId, operations: [...] }
//! ```
//!
//! `operations` is the canonical diff stream. Consumers apply it in log order
//! and never reorder or drop entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Open prop bag. Insertion order is preserved.
pub type Props = Map<String, Value>;

/// One entry of the append-only operation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    Insert {
        node_id: String,
        component_type: String,
        props: Props,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Carries only the keys whose value changed
    #[serde(rename_all = "camelCase")]
    Update {
        node_id: String,
        component_type: String,
        props: Props,
    },
    #[serde(rename_all = "camelCase")]
    Remove {
        node_id: String,
        component_type: String,
    },
}

impl Operation {
    pub fn node_id(&self) -> &str {
        match self {
            Operation::Insert { node_id, .. }
            | Operation::Update { node_id, .. }
            | Operation::Remove { node_id, .. } => node_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Update { .. } => "update",
            Operation::Remove { .. } => "remove",
        }
    }
}

/// Snapshot of one node as it appears in the adjacency list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub props: Props,
    pub children: Vec<String>,
}

/// Adjacency-list payload. `nodes` is keyed in sorted id order so the
/// serialized form is stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyList {
    pub nodes: BTreeMap<String, NodeSnapshot>,
    pub root_id: Option<String>,
    pub operations: Vec<Operation>,
}

/// Convenience for building prop bags from `(key, value)` pairs
pub fn props<K, V, I>(pairs: I) -> Props
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_operation_wire_shape() {
        let op = Operation::Insert {
            node_id: "card-1".into(),
            component_type: "Card".into(),
            props: props([("title", "Inbox")]),
            parent_id: Some("layout-0".into()),
            index: Some(0),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "type": "insert",
                "nodeId": "card-1",
                "componentType": "Card",
                "props": {"title": "Inbox"},
                "parentId": "layout-0",
                "index": 0
            })
        );
    }

    #[test]
    fn test_remove_operation_kind() {
        let op = Operation::Remove {
            node_id: "n".into(),
            component_type: "TextBlock".into(),
        };
        assert_eq!(op.kind(), "remove");
        assert_eq!(serde_json::to_value(&op).unwrap()["type"], "remove");
    }

    #[test]
    fn test_props_preserve_insertion_order() {
        let p = props([("zeta", 1), ("alpha", 2)]);
        let keys: Vec<&String> = p.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
