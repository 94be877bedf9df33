//! Component Graph
//!
//! An addressable, mutable graph of UI nodes with an append-only operation
//! log. A fresh graph is built per render cycle.
//!
//! # Architecture
//!
//! ```text
//! add_node / insert_node ──► Insert ─┐
//! update_node ─────────────► Update ─┼──► operation log (append-only)
//! remove_node ─────────────► Remove ─┘
//! add_child ──► children linkage only (no operation)
//!
//! to_adjacency_list() ──► { nodes, rootId, operations }   (wire format)
//! to_tree()           ──► nested JSON for legacy consumers
//! ```

mod component;
mod props;

pub use component::*;
pub use props::*;
