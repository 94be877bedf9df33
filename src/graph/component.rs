//! Component graph storage and mutation
//!
//! Invariants:
//! - every id in a `children` list exists in the node map
//! - a node has at most one parent
//! - every mutation that creates, changes or deletes a node appends exactly
//!   one operation per affected node, in the order the change happened

use chunkflow_types::{AdjacencyList, NodeSnapshot, Operation, Props};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::props::ComponentKind;
use crate::error::{GraphError, GraphResult};

/// One UI element owned by a `ComponentGraph`
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: ComponentKind,
    pub props: Props,
    pub children: Vec<String>,
}

impl Node {
    fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id.clone(),
            component_type: self.kind.as_str().to_string(),
            props: self.props.clone(),
            children: self.children.clone(),
        }
    }
}

/// Addressable UI node graph with an append-only operation log
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    nodes: BTreeMap<String, Node>,
    /// child id -> parent id
    parents: HashMap<String, String>,
    root_id: Option<String>,
    operations: Vec<Operation>,
    next_seq: u64,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node and append an `Insert` operation.
    ///
    /// The node becomes root when no root is set. Supplying an id that is
    /// already live is a `DuplicateNode` error.
    pub fn add_node(
        &mut self,
        kind: impl Into<ComponentKind>,
        props: impl Into<Props>,
        id: Option<&str>,
    ) -> GraphResult<String> {
        let kind = kind.into();
        let id = self.claim_id(&kind, id)?;
        let props = props.into();

        self.operations.push(Operation::Insert {
            node_id: id.clone(),
            component_type: kind.as_str().to_string(),
            props: props.clone(),
            parent_id: None,
            index: None,
        });
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                kind,
                props,
                children: Vec::new(),
            },
        );

        if self.root_id.is_none() {
            self.root_id = Some(id.clone());
        }
        debug!(node_id = %id, "node added");
        Ok(id)
    }

    /// Create a node directly under `parent_id`.
    ///
    /// Unlike `add_node` + `add_child`, the parent and final index are
    /// recorded on the `Insert` operation so a log-only consumer can rebuild
    /// the structure.
    pub fn insert_node(
        &mut self,
        parent_id: &str,
        kind: impl Into<ComponentKind>,
        props: impl Into<Props>,
        index: Option<usize>,
    ) -> GraphResult<String> {
        if !self.nodes.contains_key(parent_id) {
            return Err(GraphError::NotFound(parent_id.to_string()));
        }
        let kind = kind.into();
        let id = self.claim_id(&kind, None)?;
        let props = props.into();

        let position = self.link(parent_id, &id, index);
        self.operations.push(Operation::Insert {
            node_id: id.clone(),
            component_type: kind.as_str().to_string(),
            props: props.clone(),
            parent_id: Some(parent_id.to_string()),
            index: Some(position),
        });
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                kind,
                props,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Attach `child_id` under `parent_id` at `index` (appends when `None`).
    ///
    /// A child that already has a parent is moved. No operation is logged.
    pub fn add_child(
        &mut self,
        parent_id: &str,
        child_id: &str,
        index: Option<usize>,
    ) -> GraphResult<()> {
        if !self.nodes.contains_key(parent_id) {
            return Err(GraphError::NotFound(parent_id.to_string()));
        }
        if !self.nodes.contains_key(child_id) {
            return Err(GraphError::NotFound(child_id.to_string()));
        }
        if parent_id == child_id {
            return Err(GraphError::SelfReference(child_id.to_string()));
        }
        if self.ancestors(parent_id).any(|a| a == child_id) {
            return Err(GraphError::CycleDetected {
                parent: parent_id.to_string(),
                child: child_id.to_string(),
            });
        }

        self.detach(child_id);
        self.link(parent_id, child_id, index);

        if self.root_id.as_deref() == Some(child_id) {
            self.root_id = Some(self.topmost(parent_id));
        }
        Ok(())
    }

    /// Shallow-merge `partial` into the node's props.
    ///
    /// New keys are added and existing keys overwritten wholesale; nested
    /// objects are replaced, never merged. The `Update` operation carries
    /// only keys whose value actually changed, and is skipped when nothing
    /// changed.
    pub fn update_node(&mut self, id: &str, partial: impl Into<Props>) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        let mut changed = Props::new();
        for (key, value) in partial.into() {
            if node.props.get(&key) != Some(&value) {
                node.props.insert(key.clone(), value.clone());
                changed.insert(key, value);
            }
        }

        if !changed.is_empty() {
            self.operations.push(Operation::Update {
                node_id: id.to_string(),
                component_type: node.kind.as_str().to_string(),
                props: changed,
            });
        }
        Ok(())
    }

    /// Remove a node and all of its descendants.
    ///
    /// Idempotent: removing an absent id is a no-op. Every removed id gets
    /// its own `Remove` operation, descendants before ancestors.
    pub fn remove_node(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            return;
        }

        self.detach(id);
        let mut doomed = Vec::new();
        self.collect_post_order(id, &mut doomed);

        for node_id in &doomed {
            if let Some(node) = self.nodes.remove(node_id) {
                self.parents.remove(node_id);
                self.operations.push(Operation::Remove {
                    node_id: node.id,
                    component_type: node.kind.as_str().to_string(),
                });
            }
        }
        debug!(node_id = %id, removed = doomed.len(), "subtree removed");

        let root_gone = self
            .root_id
            .as_ref()
            .is_some_and(|root| !self.nodes.contains_key(root));
        if root_gone {
            self.root_id = self.pick_new_root();
        }
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn children_of(&self, id: &str) -> Option<&[String]> {
        self.nodes.get(id).map(|n| n.children.as_slice())
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Side-effect-free wire snapshot in stable key order
    pub fn to_adjacency_list(&self) -> AdjacencyList {
        AdjacencyList {
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| (id.clone(), node.snapshot()))
                .collect(),
            root_id: self.root_id.clone(),
            operations: self.operations.clone(),
        }
    }

    /// Resolve the graph into a nested structure by walking from root.
    ///
    /// Unknown component kinds become a `Passthrough` node carrying the
    /// original tag. Returns `Value::Null` for a rootless graph.
    pub fn to_tree(&self) -> Value {
        let mut visited = HashSet::new();
        match &self.root_id {
            Some(root) => self.tree_node(root, &mut visited).unwrap_or(Value::Null),
            None => Value::Null,
        }
    }

    fn tree_node(&self, id: &str, visited: &mut HashSet<String>) -> Option<Value> {
        if !visited.insert(id.to_string()) {
            return None;
        }
        let node = self.nodes.get(id)?;
        let children: Vec<Value> = node
            .children
            .iter()
            .filter_map(|child| self.tree_node(child, visited))
            .collect();

        let mut out = Map::new();
        out.insert("id".into(), json!(node.id));
        if node.kind.is_known() {
            out.insert("type".into(), json!(node.kind.as_str()));
        } else {
            out.insert("type".into(), json!("Passthrough"));
            out.insert("originalType".into(), json!(node.kind.as_str()));
        }
        out.insert("props".into(), Value::Object(node.props.clone()));
        out.insert("children".into(), Value::Array(children));
        Some(Value::Object(out))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn claim_id(&mut self, kind: &ComponentKind, requested: Option<&str>) -> GraphResult<String> {
        if let Some(id) = requested {
            if self.nodes.contains_key(id) {
                return Err(GraphError::DuplicateNode(id.to_string()));
            }
            return Ok(id.to_string());
        }
        let prefix = kind.as_str().to_lowercase();
        loop {
            let candidate = format!("{}-{}", prefix, self.next_seq);
            self.next_seq += 1;
            if !self.nodes.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Insert into the parent's children list, returning the final position
    fn link(&mut self, parent_id: &str, child_id: &str, index: Option<usize>) -> usize {
        let position = match self.nodes.get_mut(parent_id) {
            Some(parent) => {
                let position = index
                    .unwrap_or(parent.children.len())
                    .min(parent.children.len());
                parent.children.insert(position, child_id.to_string());
                position
            }
            None => 0,
        };
        self.parents
            .insert(child_id.to_string(), parent_id.to_string());
        position
    }

    fn detach(&mut self, child_id: &str) {
        if let Some(parent_id) = self.parents.remove(child_id) {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| c != child_id);
            }
        }
    }

    fn collect_post_order(&self, id: &str, out: &mut Vec<String>) {
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.collect_post_order(child, out);
            }
            out.push(id.to_string());
        }
    }

    fn ancestors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::successors(self.parents.get(id).map(String::as_str), move |current| {
            self.parents.get(*current).map(String::as_str)
        })
    }

    fn topmost(&self, id: &str) -> String {
        self.ancestors(id)
            .last()
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    /// Prefer a parentless node so the new root is a tree top
    fn pick_new_root(&self) -> Option<String> {
        self.nodes
            .keys()
            .find(|id| !self.parents.contains_key(*id))
            .or_else(|| self.nodes.keys().next())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypedProps;
    use chunkflow_types::props;
    use pretty_assertions::assert_eq;

    fn card(title: &str) -> Props {
        TypedProps::Card {
            title: title.into(),
            subtitle: None,
        }
        .into()
    }

    #[test]
    fn test_first_node_becomes_root() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let other = graph.add_node("Card", card("A"), None).unwrap();
        assert_eq!(graph.root_id(), Some(root.as_str()));
        assert_ne!(root, other);
        assert_eq!(graph.operations().len(), 2);
        assert_eq!(graph.operations()[0].kind(), "insert");
    }

    #[test]
    fn test_explicit_duplicate_id_rejected() {
        let mut graph = ComponentGraph::new();
        graph.add_node("Card", card("A"), Some("main")).unwrap();
        let err = graph.add_node("Card", card("B"), Some("main")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode("main".into()));
    }

    #[test]
    fn test_add_child_missing_ids_fail_fast() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        assert_eq!(
            graph.add_child(&root, "ghost", None),
            Err(GraphError::NotFound("ghost".into()))
        );
        assert_eq!(
            graph.add_child("ghost", &root, None),
            Err(GraphError::NotFound("ghost".into()))
        );
    }

    #[test]
    fn test_add_child_respects_index_and_logs_nothing() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let a = graph.add_node("Card", card("A"), None).unwrap();
        let b = graph.add_node("Card", card("B"), None).unwrap();
        let ops_before = graph.operations().len();

        graph.add_child(&root, &a, None).unwrap();
        graph.add_child(&root, &b, Some(0)).unwrap();

        assert_eq!(graph.children_of(&root).unwrap(), &[b.clone(), a.clone()]);
        assert_eq!(graph.operations().len(), ops_before);
        assert_eq!(graph.parent_of(&a), Some(root.as_str()));
    }

    #[test]
    fn test_add_child_reparents() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let left = graph.insert_node(&root, "Layout", Props::new(), None).unwrap();
        let right = graph.insert_node(&root, "Layout", Props::new(), None).unwrap();
        let leaf = graph.insert_node(&left, "TextBlock", Props::new(), None).unwrap();

        graph.add_child(&right, &leaf, None).unwrap();

        assert!(graph.children_of(&left).unwrap().is_empty());
        assert_eq!(graph.children_of(&right).unwrap(), &[leaf.clone()]);
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let inner = graph.insert_node(&root, "Layout", Props::new(), None).unwrap();

        assert!(matches!(
            graph.add_child(&inner, &root, None),
            Err(GraphError::CycleDetected { .. })
        ));
        assert_eq!(
            graph.add_child(&inner, &inner, None),
            Err(GraphError::SelfReference(inner.clone()))
        );
    }

    #[test]
    fn test_insert_node_records_parent_and_index() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        graph.insert_node(&root, "Card", card("A"), None).unwrap();
        let first = graph.insert_node(&root, "Card", card("B"), Some(0)).unwrap();

        match graph.operations().last().unwrap() {
            Operation::Insert {
                node_id,
                parent_id,
                index,
                ..
            } => {
                assert_eq!(node_id, &first);
                assert_eq!(parent_id.as_deref(), Some(root.as_str()));
                assert_eq!(*index, Some(0));
            }
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[test]
    fn test_update_is_shallow_and_logs_only_changed_keys() {
        let mut graph = ComponentGraph::new();
        let id = graph
            .add_node(
                "Card",
                props([
                    ("title", json!("Inbox")),
                    ("meta", json!({"unread": 3, "flagged": 1})),
                ]),
                None,
            )
            .unwrap();

        graph
            .update_node(
                &id,
                props([("title", json!("Inbox")), ("meta", json!({"unread": 4}))]),
            )
            .unwrap();

        let node = graph.get_node(&id).unwrap();
        // nested object replaced, not merged
        assert_eq!(node.props["meta"], json!({"unread": 4}));
        match graph.operations().last().unwrap() {
            Operation::Update { props, .. } => {
                assert_eq!(props.len(), 1);
                assert!(props.contains_key("meta"));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_update_without_changes_appends_nothing() {
        let mut graph = ComponentGraph::new();
        let id = graph.add_node("Card", card("A"), None).unwrap();
        graph.update_node(&id, card("A")).unwrap();
        assert_eq!(graph.operations().len(), 1);
    }

    #[test]
    fn test_update_missing_node_fails() {
        let mut graph = ComponentGraph::new();
        assert_eq!(
            graph.update_node("nope", Props::new()),
            Err(GraphError::NotFound("nope".into()))
        );
    }

    #[test]
    fn test_remove_cascades_with_one_op_per_node() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let list = graph.insert_node(&root, "List", Props::new(), None).unwrap();
        let item_a = graph.insert_node(&list, "ListItem", Props::new(), None).unwrap();
        let item_b = graph.insert_node(&list, "ListItem", Props::new(), None).unwrap();
        let ops_before = graph.operations().len();

        graph.remove_node(&list);

        assert_eq!(graph.len(), 1);
        assert!(graph.children_of(&root).unwrap().is_empty());
        let removed: Vec<&str> = graph.operations()[ops_before..]
            .iter()
            .map(|op| op.node_id())
            .collect();
        assert_eq!(removed, vec![item_a.as_str(), item_b.as_str(), list.as_str()]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let child = graph.insert_node(&root, "Card", card("A"), None).unwrap();

        graph.remove_node(&child);
        let snapshot = graph.to_adjacency_list();
        graph.remove_node(&child);

        assert_eq!(graph.to_adjacency_list(), snapshot);
    }

    #[test]
    fn test_removing_root_promotes_parentless_node() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        let orphan = graph.add_node("Card", card("A"), None).unwrap();
        graph.remove_node(&root);
        assert_eq!(graph.root_id(), Some(orphan.as_str()));

        graph.remove_node(&orphan);
        assert_eq!(graph.root_id(), None);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_to_tree_walks_children_in_order() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), Some("root")).unwrap();
        graph.insert_node(&root, "TextBlock", Props::new(), None).unwrap();
        graph.insert_node(&root, "Card", card("A"), None).unwrap();

        let tree = graph.to_tree();
        assert_eq!(tree["id"], json!("root"));
        let kinds: Vec<&str> = tree["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["TextBlock", "Card"]);
    }

    #[test]
    fn test_to_tree_passthrough_for_unknown_kind() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), None).unwrap();
        graph
            .insert_node(&root, "WeatherWidget", props([("city", "Oslo")]), None)
            .unwrap();

        let tree = graph.to_tree();
        let widget = &tree["children"][0];
        assert_eq!(widget["type"], json!("Passthrough"));
        assert_eq!(widget["originalType"], json!("WeatherWidget"));
        assert_eq!(widget["props"]["city"], json!("Oslo"));
    }

    #[test]
    fn test_empty_graph_tree_is_null() {
        assert_eq!(ComponentGraph::new().to_tree(), Value::Null);
    }

    #[test]
    fn test_adjacency_list_serializes_wire_shape() {
        let mut graph = ComponentGraph::new();
        let root = graph.add_node("Layout", Props::new(), Some("root")).unwrap();
        graph.insert_node(&root, "Card", card("A"), None).unwrap();

        let wire = serde_json::to_value(graph.to_adjacency_list()).unwrap();
        assert_eq!(wire["rootId"], json!("root"));
        assert_eq!(wire["nodes"]["root"]["type"], json!("Layout"));
        assert_eq!(wire["nodes"]["root"]["children"], json!(["card-0"]));
        assert_eq!(wire["operations"][1]["parentId"], json!("root"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Add,
        Insert { parent: usize, index: Option<usize> },
        Link { parent: usize, child: usize, index: Option<usize> },
        Update { target: usize, value: u8 },
        Remove { target: usize },
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Add),
            (any::<usize>(), proptest::option::of(0usize..4))
                .prop_map(|(parent, index)| Step::Insert { parent, index }),
            (any::<usize>(), any::<usize>(), proptest::option::of(0usize..4))
                .prop_map(|(parent, child, index)| Step::Link { parent, child, index }),
            (any::<usize>(), any::<u8>()).prop_map(|(target, value)| Step::Update { target, value }),
            any::<usize>().prop_map(|target| Step::Remove { target }),
        ]
    }

    /// Pick a live id by index, or an id that never existed
    fn pick(graph: &ComponentGraph, n: usize) -> String {
        let ids: Vec<&String> = graph.nodes.keys().collect();
        if ids.is_empty() || n % 5 == 0 {
            "missing".to_string()
        } else {
            ids[n % ids.len()].clone()
        }
    }

    fn apply(graph: &mut ComponentGraph, step: &Step) {
        match step {
            Step::Add => {
                graph.add_node("Card", Props::new(), None).unwrap();
            }
            Step::Insert { parent, index } => {
                let parent = pick(graph, *parent);
                let _ = graph.insert_node(&parent, "TextBlock", Props::new(), *index);
            }
            Step::Link {
                parent,
                child,
                index,
            } => {
                let parent = pick(graph, *parent);
                let child = pick(graph, *child);
                let _ = graph.add_child(&parent, &child, *index);
            }
            Step::Update { target, value } => {
                let target = pick(graph, *target);
                let _ = graph.update_node(
                    &target,
                    chunkflow_types::props([("v", *value as u64)]),
                );
            }
            Step::Remove { target } => {
                let target = pick(graph, *target);
                graph.remove_node(&target);
            }
        }
    }

    proptest! {
        #[test]
        fn snapshot_matches_live_nodes(steps in proptest::collection::vec(arb_step(), 0..60)) {
            let mut graph = ComponentGraph::new();
            for step in &steps {
                apply(&mut graph, step);
            }

            let snapshot = graph.to_adjacency_list();
            let live: Vec<&String> = graph.nodes.keys().collect();
            let keys: Vec<&String> = snapshot.nodes.keys().collect();
            prop_assert_eq!(live, keys);

            for node in snapshot.nodes.values() {
                for child in &node.children {
                    prop_assert!(snapshot.nodes.contains_key(child));
                }
            }
            if let Some(root) = &snapshot.root_id {
                prop_assert!(snapshot.nodes.contains_key(root));
            }
        }

        #[test]
        fn double_remove_is_idempotent(
            steps in proptest::collection::vec(arb_step(), 0..40),
            target in any::<usize>(),
        ) {
            let mut graph = ComponentGraph::new();
            for step in &steps {
                apply(&mut graph, step);
            }
            let target = pick(&graph, target);
            graph.remove_node(&target);
            let once = graph.to_adjacency_list();
            graph.remove_node(&target);
            prop_assert_eq!(once, graph.to_adjacency_list());
        }
    }
}
