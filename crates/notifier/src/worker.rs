//! Dispatch worker: drains due units from the queue.
//!
//! Each claimed unit runs in its own task, so a slow or failing send never
//! holds up the others. Units are removed from the queue when claimed;
//! a failed send is logged and not retried. Sends still in flight at
//! shutdown are awaited before `run` returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinSet;

use herald_common::error::AppError;
use herald_engine::queue::DueUnitSource;

use crate::dispatcher::Dispatcher;

pub struct DispatchWorker {
    source: Arc<dyn DueUnitSource>,
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
    batch_size: usize,
    in_flight: JoinSet<()>,
}

impl DispatchWorker {
    pub fn new(
        source: Arc<dyn DueUnitSource>,
        dispatcher: Dispatcher,
        poll_interval_ms: u64,
        batch_size: usize,
    ) -> Self {
        Self {
            source,
            dispatcher: Arc::new(dispatcher),
            poll_interval: Duration::from_millis(poll_interval_ms),
            batch_size: batch_size.max(1),
            in_flight: JoinSet::new(),
        }
    }

    /// Poll until `shutdown` resolves, then wait for in-flight sends.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            queue = %self.source.describe(),
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            channels = ?self.dispatcher.enabled_channels(),
            "Dispatch worker started"
        );

        tokio::pin!(shutdown);

        loop {
            let delay = match self.poll_once().await {
                // A full batch means more units may already be due
                Ok(claimed) if claimed == self.batch_size => Duration::ZERO,
                Ok(_) => self.poll_interval,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to claim due dispatch units");
                    self.poll_interval
                }
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!(
            in_flight = self.in_flight.len(),
            "Dispatch worker stopping, waiting for in-flight sends"
        );
        self.drain().await;
    }

    /// Claim one batch of due units and spawn their sends. Returns how many were claimed.
    pub async fn poll_once(&mut self) -> Result<usize, AppError> {
        // Reap finished sends so the set doesn't grow unbounded
        while let Some(result) = self.in_flight.try_join_next() {
            log_join_error(result);
        }

        let units = self.source.claim_due(Utc::now(), self.batch_size).await?;
        let claimed = units.len();

        if claimed > 0 {
            tracing::debug!(claimed, "Claimed due dispatch units");
        }

        for unit in units {
            let dispatcher = self.dispatcher.clone();
            self.in_flight.spawn(async move {
                // Outcome already logged by the dispatcher
                let _ = dispatcher.execute(&unit).await;
            });
        }

        Ok(claimed)
    }

    /// Number of sends spawned and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Wait for every spawned send to finish.
    pub async fn drain(&mut self) {
        while let Some(result) = self.in_flight.join_next().await {
            log_join_error(result);
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Dispatch task aborted");
    }
}
