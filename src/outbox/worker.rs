//! Dispatch Worker
//!
//! Background loop that runs a dispatch cycle on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::dispatcher::{DispatchReport, NotificationDispatcher};
use super::error::OutboxError;
use super::ports::{NotificationSender, NotificationsOutbox};

/// Configuration for the dispatch worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between two dispatch cycles
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

pub struct DispatchWorker<O, S> {
    dispatcher: Arc<NotificationDispatcher<O, S>>,
    config: WorkerConfig,
}

impl<O, S> DispatchWorker<O, S>
where
    O: NotificationsOutbox,
    S: NotificationSender<O::Tx>,
{
    pub fn new(dispatcher: Arc<NotificationDispatcher<O, S>>, config: WorkerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Run until `shutdown` becomes `true` or its sender is dropped
    ///
    /// A cycle already in progress always finishes before the loop exits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            claim_limit = self.dispatcher.claim_limit(),
            "Starting dispatch worker"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Failures are logged by run_once; the next tick retries
            if self.run_once().await.is_err() {
                debug!("Dispatch cycle will be retried");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Dispatch worker stopped");
    }

    /// Run a single dispatch cycle and log its outcome
    pub async fn run_once(&self) -> Result<DispatchReport, OutboxError> {
        match self.dispatcher.dispatch().await {
            Ok(report) if report.is_empty() => {
                debug!("No pending notifications");
                Ok(report)
            }
            Ok(report) => {
                info!(
                    claimed = report.claimed,
                    completed = report.completed,
                    failed = report.failed,
                    mark_errors = report.mark_errors,
                    "Dispatch cycle committed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, code = e.code(), "Dispatch cycle failed");
                Err(e)
            }
        }
    }
}
