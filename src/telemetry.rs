//! Tracing setup for binaries and tests embedding the core

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Preferred filter variable; `RUST_LOG` is consulted when it is unset
pub const LOG_ENV: &str = "CHUNKFLOW_LOG";

/// Install a fmt subscriber filtered by `CHUNKFLOW_LOG`, then `RUST_LOG`,
/// then `info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}
