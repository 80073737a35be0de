//! Process-wide logging bootstrap.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a process-wide `tracing` subscriber. `RPAX_LOG` takes
/// precedence over `RUST_LOG`; absent both, falls back to `rpax=info`.
pub fn init() {
    let filter = std::env::var("RPAX_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("rpax=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
