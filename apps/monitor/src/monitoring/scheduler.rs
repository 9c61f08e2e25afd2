use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::executor::ProbeExecutor;
use super::types::ProbeOutcome;
use crate::config::Endpoint;
use crate::history::HistoryStore;

/// Upper bound on concurrently executing probes within one cycle, so a
/// very large registry cannot open unbounded network connections.
const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// Fans a snapshot of endpoints out into concurrent probes and collects
/// every outcome before returning.
pub struct ProbeScheduler {
    executor: Arc<ProbeExecutor>,
    sink: Arc<dyn HistoryStore>,
    max_concurrency: usize,
}

impl ProbeScheduler {
    pub fn new(executor: Arc<ProbeExecutor>, sink: Arc<dyn HistoryStore>) -> Self {
        Self { executor, sink, max_concurrency: DEFAULT_MAX_CONCURRENCY }
    }

    /// Override the probe concurrency bound.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Run one fan-out cycle over the given endpoint snapshot.
    ///
    /// Every endpoint is probed exactly once. Probes run as independent
    /// tasks: a slow or failing probe never blocks its siblings, only
    /// the overall return is gated on all of them finishing. Each
    /// outcome is appended to the sink as soon as its probe completes;
    /// append failures are logged and never abort the cycle. Outcomes
    /// are collected in input order.
    pub async fn run_cycle(&self, endpoints: BTreeMap<String, Endpoint>) -> Vec<ProbeOutcome> {
        if endpoints.is_empty() {
            tracing::debug!("fan-out skipped: no endpoints to probe");
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.max_concurrency.min(endpoints.len())));

        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|(name, endpoint)| {
                let executor = Arc::clone(&self.executor);
                let sink = Arc::clone(&self.sink);
                let permits = Arc::clone(&permits);

                tokio::spawn(async move {
                    let _permit =
                        permits.acquire_owned().await.expect("probe semaphore never closed");

                    let outcome = executor.probe(&name, &endpoint).await;
                    if let Err(err) = sink.append(&outcome).await {
                        tracing::error!(endpoint = %outcome.name, "failed to record outcome: {err}");
                    }
                    outcome
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in futures::future::join_all(handles).await {
            match handle {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => tracing::error!("probe task failed to complete: {err}"),
            }
        }

        outcomes
    }
}
