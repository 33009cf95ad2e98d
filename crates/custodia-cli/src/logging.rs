//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for tables and JSON output.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "custodia=info,custodia_client=info";

/// Initialize the global tracing subscriber. Call once, early in `main`.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
