use std::env::var;
use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Diagnostics default to warnings so report tables stay readable;
/// `RUST_LOG` overrides the filter.
pub fn init() {
    initialize_tracing(LevelFilter::WARN);
}

/// Initialize tracing subscriber with default configuration.
///
/// Diagnostics go to stderr, leaving stdout to command output. Setting
/// `RUST_LOG_FORMAT=json` switches to line-delimited JSON for log
/// collection.
fn initialize_tracing(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT").unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).init();
}
