//! Rendering
//!
//! Two steps: a `ViewRenderer` turns a resolved intent plus opaque domain
//! data into an ordered list of chunks, and `build_view_graph` lays the
//! (contract-checked) chunks out as a fresh component graph.

mod chunks;
mod layout;

pub use chunks::*;
pub use layout::*;

use chunkflow_types::{Chunk, UiState};
use serde_json::Value;

use crate::intent::IntentCandidate;

/// Input to a renderer for one response
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub intent: &'a IntentCandidate,
    /// View the session is in after the transition
    pub state: UiState,
    /// Domain data from the data-source adapter; `Null` when none
    pub data: &'a Value,
}

/// Produces the chunks for a resolved intent. Output order is authoritative.
pub trait ViewRenderer: Send + Sync {
    fn render_chunks(&self, request: &RenderRequest<'_>) -> Vec<Chunk>;
}
