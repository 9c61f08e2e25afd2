use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::scheduler::ProbeScheduler;
use super::types::ProbeOutcome;
use crate::config::Registry;

/// Phases of the cadence loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Idle,
    Running,
    Sleeping,
    Stopped,
}

/// Drives fan-out cycles at a fixed cadence until cancelled.
///
/// The interval is measured from the end of one fan-out to the start of
/// the next, so the effective cycle period is fan-out duration plus the
/// configured interval. Probe failures never stop the driver; only the
/// cancellation token does. Probes already in flight when cancellation
/// arrives run to completion.
pub struct CadenceDriver {
    scheduler: Arc<ProbeScheduler>,
    interval: Duration,
    cycle_tx: mpsc::Sender<Vec<ProbeOutcome>>,
}

impl CadenceDriver {
    pub fn new(
        scheduler: Arc<ProbeScheduler>,
        interval: Duration,
        cycle_tx: mpsc::Sender<Vec<ProbeOutcome>>,
    ) -> Self {
        Self { scheduler, interval, cycle_tx }
    }

    /// Run cycles until `cancel` fires.
    ///
    /// A fresh snapshot of the registry is taken at the start of every
    /// cycle, and each cycle's outcomes are delivered over the cycle
    /// channel. Cancellation is observed while sleeping and again before
    /// a new fan-out starts.
    pub async fn run(&self, registry: &Registry, filter: Option<&[String]>, cancel: CancellationToken) {
        let mut state = DriverState::Idle;
        tracing::debug!(?state, interval_seconds = self.interval.as_secs(), "cadence driver ready");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            state = DriverState::Running;
            tracing::debug!(?state, "starting fan-out cycle");

            let snapshot = registry.select(filter);
            let outcomes = self.scheduler.run_cycle(snapshot).await;

            if self.cycle_tx.send(outcomes).await.is_err() {
                tracing::debug!("cycle receiver dropped, stopping");
                break;
            }

            state = DriverState::Sleeping;
            tracing::debug!(?state, "cycle complete");

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = sleep(self.interval) => {}
            }
        }

        state = DriverState::Stopped;
        tracing::debug!(?state, "cadence driver stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryError, HistoryRow, HistoryStore};
    use crate::monitoring::checker::{Checker, Exchange};
    use crate::monitoring::executor::ProbeExecutor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullSink;

    #[async_trait]
    impl HistoryStore for NullSink {
        async fn append(&self, _outcome: &ProbeOutcome) -> Result<(), HistoryError> {
            Ok(())
        }

        async fn read_all(
            &self,
            _filter: Option<&[String]>,
        ) -> Result<Vec<HistoryRow>, HistoryError> {
            Ok(Vec::new())
        }
    }

    /// Counts probes; optionally cancels the token from inside a probe
    /// to model cancellation arriving while a cycle is running.
    struct CountingChecker {
        calls: Arc<AtomicUsize>,
        cancel_on_call: Option<CancellationToken>,
    }

    #[async_trait]
    impl Checker for CountingChecker {
        async fn check(&self, _url: &str, _timeout: Duration) -> anyhow::Result<Exchange> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(cancel) = &self.cancel_on_call {
                cancel.cancel();
            }
            Ok(Exchange { status_code: 200, latency_ms: 1.0 })
        }
    }

    fn single_endpoint_registry() -> Registry {
        let mut registry = Registry::default();
        registry.add("svc".into(), "http://example.com".into(), 5);
        registry
    }

    fn driver_with(
        calls: Arc<AtomicUsize>,
        cancel_on_call: Option<CancellationToken>,
        interval: Duration,
        cycle_tx: mpsc::Sender<Vec<ProbeOutcome>>,
    ) -> CadenceDriver {
        let checker = Arc::new(CountingChecker { calls, cancel_on_call });
        let executor = Arc::new(ProbeExecutor::new(checker));
        let scheduler = Arc::new(ProbeScheduler::new(executor, Arc::new(NullSink)));
        CadenceDriver::new(scheduler, interval, cycle_tx)
    }

    #[tokio::test]
    async fn zero_interval_with_cancellation_runs_exactly_one_cycle() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (cycle_tx, mut cycle_rx) = mpsc::channel(4);
        let driver =
            driver_with(Arc::clone(&calls), Some(cancel.clone()), Duration::ZERO, cycle_tx);

        let registry = single_endpoint_registry();
        driver.run(&registry, None, cancel).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let outcomes = cycle_rx.recv().await.expect("one cycle of outcomes");
        assert_eq!(outcomes.len(), 1);

        drop(driver);
        assert!(cycle_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_before_start_runs_no_cycles() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let calls = Arc::new(AtomicUsize::new(0));
        let (cycle_tx, mut cycle_rx) = mpsc::channel(4);
        let driver = driver_with(Arc::clone(&calls), None, Duration::ZERO, cycle_tx);

        let registry = single_endpoint_registry();
        driver.run(&registry, None, cancel).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        drop(driver);
        assert!(cycle_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_sleep_phase() {
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (cycle_tx, mut cycle_rx) = mpsc::channel(4);
        let driver = driver_with(Arc::clone(&calls), None, Duration::from_secs(60), cycle_tx);

        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let registry = single_endpoint_registry();
            driver.run(&registry, None, run_cancel).await;
        });

        // First cycle completes, then the driver sleeps.
        let outcomes = cycle_rx.recv().await.expect("first cycle of outcomes");
        assert_eq!(outcomes.len(), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("driver stops promptly once cancelled")
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
