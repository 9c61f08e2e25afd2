use thiserror::Error;

use crate::config::ConfigError;
use crate::history::HistoryError;

/// Failures that abort a command and are reported to the user.
///
/// Individual probe failures are never represented here - they are
/// recorded as outcomes and surface as DOWN rows in reports.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("endpoint '{name}' already exists")]
    DuplicateEndpoint { name: String },

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("timeout must be at least 1 second")]
    InvalidTimeout,

    #[error("failed to build HTTP client: {source:#}")]
    Client {
        #[source]
        source: anyhow::Error,
    },
}
