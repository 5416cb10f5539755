//! Structured logging initialization.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level when set
//! - Request IDs flow through handler spans, not a global context

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `log_level` comes from `observability.log_level` and seeds the default
/// filter for this crate; the `RUST_LOG` environment variable overrides it.
pub fn init_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("delta_gateway={log_level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
