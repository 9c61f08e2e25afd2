use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use super::checker::Checker;
use super::types::ProbeOutcome;
use crate::config::Endpoint;

/// Probe executor - issues individual probes, one endpoint in, one
/// outcome out.
pub struct ProbeExecutor {
    checker: Arc<dyn Checker>,
}

impl ProbeExecutor {
    pub fn new(checker: Arc<dyn Checker>) -> Self {
        Self { checker }
    }

    /// Probe one endpoint.
    ///
    /// The timestamp is captured before the exchange begins and attached
    /// to the outcome regardless of how it ends. Recording the outcome
    /// is the caller's concern; this never touches the history store.
    pub async fn probe(&self, name: &str, endpoint: &Endpoint) -> ProbeOutcome {
        let timestamp = Local::now();
        let timeout = Duration::from_secs(endpoint.timeout);

        match self.checker.check(&endpoint.url, timeout).await {
            Ok(exchange) => ProbeOutcome::completed(
                name,
                &endpoint.url,
                timestamp,
                exchange.status_code,
                exchange.latency_ms,
            ),
            Err(err) => ProbeOutcome::failed(name, &endpoint.url, timestamp, format!("{err:#}")),
        }
    }
}
