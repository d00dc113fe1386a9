//! Interval scheduler that drives the execution coordinator forever

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::core::coordinator::ExecutionCoordinator;
use crate::metrics::Metrics;
use crate::models::report::{CycleOutcome, CycleReport};

/// Fixed wait after a failed cycle.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Most recent cycle report, shared with the status server.
pub type LatestReport = Arc<RwLock<Option<CycleReport>>>;

pub struct CycleScheduler {
    coordinator: Arc<ExecutionCoordinator>,
    interval: Duration,
    latest: LatestReport,
    metrics: Arc<Metrics>,
    shutdown: watch::Sender<bool>,
    handle: RwLock<Option<JoinHandle<()>>>,
}

impl CycleScheduler {
    pub fn new(
        coordinator: Arc<ExecutionCoordinator>,
        interval: Duration,
        latest: LatestReport,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            coordinator,
            interval,
            latest,
            metrics,
            shutdown,
            handle: RwLock::new(None),
        }
    }

    pub fn latest(&self) -> LatestReport {
        self.latest.clone()
    }

    /// Spawn the loop task. No-op if it is already running.
    pub async fn start(&self) {
        let mut handle = self.handle.write().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("CycleScheduler: already running");
            return;
        }

        self.shutdown.send_replace(false);
        let worker = LoopWorker {
            coordinator: self.coordinator.clone(),
            interval: self.interval,
            latest: self.latest.clone(),
            metrics: self.metrics.clone(),
        };
        let shutdown = self.shutdown.subscribe();
        *handle = Some(tokio::spawn(worker.run(shutdown)));

        info!(
            symbol = %self.coordinator.symbol(),
            interval_secs = self.interval.as_secs(),
            "CycleScheduler: started"
        );
    }

    /// Signal the loop and wait for it to exit. An in-flight cycle finishes first.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);
        let handle = self.handle.write().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "CycleScheduler: loop task panicked");
            }
            info!("CycleScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .read()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

struct LoopWorker {
    coordinator: Arc<ExecutionCoordinator>,
    interval: Duration,
    latest: LatestReport,
    metrics: Arc<Metrics>,
}

impl LoopWorker {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let started = Instant::now();
            let (report, wait) = match self.coordinator.run_cycle().await {
                Ok(report) => (report, self.interval),
                Err(e) => {
                    error!(
                        symbol = %self.coordinator.symbol(),
                        error = %e,
                        backoff_secs = ERROR_BACKOFF.as_secs(),
                        "Cycle failed"
                    );
                    (CycleReport::failed(self.coordinator.symbol(), e), ERROR_BACKOFF)
                }
            };

            self.record(&report, started.elapsed());
            *self.latest.write().await = Some(report);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    // sender gone means nobody can stop us any more; treat as stop
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("CycleScheduler: loop exited");
    }

    fn record(&self, report: &CycleReport, elapsed: Duration) {
        self.metrics
            .trading_cycles_total
            .with_label_values(&[report.outcome.label()])
            .inc();
        self.metrics
            .cycle_duration_seconds
            .observe(elapsed.as_secs_f64());
        self.metrics
            .last_cycle_timestamp_seconds
            .set(Utc::now().timestamp() as f64);

        let decision = report.decision.as_ref();
        let action = decision.map(|d| d.action.to_string()).unwrap_or_default();
        let amount = decision.map(|d| d.amount).unwrap_or(0.0);
        let rsi = report.indicators.as_ref().map(|i| i.rsi);

        match &report.outcome {
            CycleOutcome::Executed { order } => info!(
                symbol = %report.symbol,
                price = ?report.price,
                rsi = ?rsi,
                action = %action,
                amount = amount,
                approved = report.approved,
                order_id = %order.id,
                "Cycle executed"
            ),
            CycleOutcome::Observed => info!(
                symbol = %report.symbol,
                price = ?report.price,
                rsi = ?rsi,
                action = %action,
                amount = amount,
                approved = report.approved,
                "Observed, no action"
            ),
            CycleOutcome::Skipped { reason } => info!(
                symbol = %report.symbol,
                reason = %reason,
                "Cycle skipped, waiting for next interval"
            ),
            CycleOutcome::Failed { error } => warn!(
                symbol = %report.symbol,
                error = %error,
                "Cycle failed, backing off"
            ),
        }
    }
}
