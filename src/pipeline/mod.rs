//! Per-session orchestration
//!
//! ```text
//! text ──► IntentEngine::resolve ──► ClarificationRequired ──► Outcome::Clarification
//!                 │
//!                 ▼ Resolved
//!          StateMachine::transition_to ──rejected──► Outcome::NavigationRejected
//!                 │ committed
//!                 ▼
//!   (await ViewDataSource) ──► ViewRenderer ──► MappingContract::enforce
//!                 │
//!                 ▼
//!   build_view_graph ──► Outcome::Rendered { state, graph, chunks }
//! ```
//!
//! Each `Session` owns its state machine and conversation history. The
//! `Orchestrator` is immutable and can be shared across sessions.

mod orchestrator;
mod session;
mod source;

pub use orchestrator::*;
pub use session::*;
pub use source::*;
