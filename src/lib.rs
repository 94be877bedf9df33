//! chunkflow - orchestration core for structured-UI conversational replies
//!
//! Turns raw user text into a rendered view:
//!
//! ```text
//! text ──► intent (entities, candidates, clarification)
//!      ──► navigation (validated transition, rollback)
//!      ──► render (chunks ──► contract ──► component graph)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chunkflow::pipeline::{Orchestrator, Outcome};
//!
//! let orchestrator = Orchestrator::from_env()?;
//! let mut session = orchestrator.new_session(Some("user-1"), None);
//!
//! match orchestrator.process(&mut session, "check my email")? {
//!     Outcome::Rendered(view) => println!("{} nodes", view.graph.nodes.len()),
//!     Outcome::Clarification(ask) => println!("{:?}", ask.questions),
//!     Outcome::NavigationRejected(rejected) => println!("{:?}", rejected.state),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod graph;
pub mod intent;
pub mod navigation;
pub mod pipeline;
pub mod render;
pub mod telemetry;

pub use chunkflow_types as types;

pub use config::{ConfigLoader, CoreConfig};
pub use contract::{MappingContract, Violation};
pub use error::{ConfigError, ConfigResult, GraphError, GraphResult, PipelineError, PipelineResult};
pub use graph::{ComponentGraph, ComponentKind, TypedProps};
pub use intent::{AmbiguityType, Entity, EntityType, IntentCandidate, IntentEngine};
pub use navigation::{NavigationPolicy, StateMachine};
pub use pipeline::{Orchestrator, Outcome, Session, ViewDataSource};
pub use render::{build_view_graph, DefaultRenderer, ViewRenderer};
