//! Timer-driven sync
//!
//! The scheduler task owns the flush timer. Timer ticks and explicit flush
//! requests both go through [`SnowflakeConnector::sync`], the same path a
//! threshold flush takes, so the cache lock serializes all of them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::WarehouseClient;
use crate::connector::{FlushReport, SnowflakeConnector};
use crate::error::ConnectorError;
use crate::host::{AuthenticationProvider, ExecutionContext};
use crate::metrics::MetricsSnapshot;

const CHANNEL_BUFFER: usize = 8;

enum SyncCommand {
    Flush(oneshot::Sender<FlushReport>),
    Shutdown,
}

/// Handle for controlling a running [`SyncScheduler`]
///
/// Cheap to clone. Dropping every handle stops the scheduler after a final
/// flush.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncCommand>,
}

impl SyncHandle {
    /// Flush now and wait for the result
    pub async fn flush(&self) -> Result<FlushReport, ConnectorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Flush(reply))
            .await
            .map_err(|_| ConnectorError::SchedulerUnavailable)?;
        rx.await.map_err(|_| ConnectorError::SchedulerUnavailable)
    }

    /// Ask the scheduler to stop after a final flush (non-blocking)
    pub fn shutdown(&self) -> Result<(), ConnectorError> {
        self.tx
            .try_send(SyncCommand::Shutdown)
            .map_err(|_| ConnectorError::SchedulerUnavailable)
    }
}

/// Background task that syncs a connector on a fixed interval
pub struct SyncScheduler<C, A> {
    connector: Arc<SnowflakeConnector<C, A>>,
    interval: Duration,
    rx: mpsc::Receiver<SyncCommand>,
    cancel: CancellationToken,
}

impl<C, A> SyncScheduler<C, A>
where
    C: WarehouseClient,
    A: AuthenticationProvider,
{
    /// Create a scheduler and its handle.
    ///
    /// The scheduler does nothing until `run()` is spawned.
    pub fn new(connector: Arc<SnowflakeConnector<C, A>>, interval: Duration) -> (Self, SyncHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let scheduler = Self {
            connector,
            interval,
            rx,
            cancel: CancellationToken::new(),
        };
        (scheduler, SyncHandle { tx })
    }

    /// Stop the loop when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run until shutdown is requested, the token is cancelled, or every
    /// handle is dropped. Always finishes with a final sync.
    pub async fn run(mut self) -> MetricsSnapshot {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            threshold = self.connector.flush_threshold(),
            "sync scheduler started"
        );

        let mut interval = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;

        // Requests use a child token so timer flushes stop with the scheduler
        let ctx = ExecutionContext::new().with_cancellation(self.cancel.child_token());

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("sync scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.connector.sync(&ctx).await;
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(SyncCommand::Flush(reply)) => {
                            let report = self.connector.sync(&ctx).await;
                            let _ = reply.send(report);
                        }
                        Some(SyncCommand::Shutdown) | None => {
                            debug!("sync scheduler shutting down");
                            break;
                        }
                    }
                }
            }
        }

        // Final flush runs even when the scheduler token was cancelled
        let report = self.connector.sync(&ExecutionContext::new()).await;
        let metrics = self.connector.metrics().snapshot();
        info!(
            retained = report.records_retained,
            records_flushed = metrics.records_flushed,
            flush_errors = metrics.flush_errors,
            "sync scheduler stopped"
        );
        metrics
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
