//! UI navigation
//!
//! A per-session state machine over the named application views. The
//! allow-list is configuration (`config/navigation.yaml`); the machine only
//! validates, records and commits.
//!
//! ```text
//! transition_to(to) ──► allowed? ──no──► false (warn, state unchanged)
//!                          │ yes
//!                          ▼
//!            record + evict + merge context + commit
//!
//! rollback_to_previous() ──► append "rollback" record, commit prior view
//! navigate_direct(to)    ──► append "api_navigation" record (bypasses allow-list)
//! ```

mod policy;
mod state_machine;

pub use policy::*;
pub use state_machine::*;
