//! Configuration types and loader
//!
//! The three rule tables (navigation allow-list, intent patterns, chunk
//! contract) are versioned YAML documents. Defaults are embedded at compile
//! time; a directory override is picked up from `CHUNKFLOW_CONFIG_DIR`.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
