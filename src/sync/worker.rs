//! SyncWorker — background driver for the sync engine
//!
//! Runs one reconciliation pass on startup, then on a fixed interval and
//! whenever an on-demand trigger arrives. Triggers landing while a run
//! is in flight coalesce inside the engine. Cancellation stops the
//! worker between runs; work already committed for processed orders is
//! retained.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::engine::{SyncEngine, SyncOutcome};

/// Buffered trigger slots; more pending triggers than this coalesce
const TRIGGER_BUFFER: usize = 1;

/// Handle for requesting an on-demand sync run
#[derive(Clone)]
pub struct SyncTrigger {
    tx: mpsc::Sender<()>,
}

impl SyncTrigger {
    /// Request a run; returns false if the worker is gone or a trigger
    /// is already queued
    pub fn trigger(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

pub struct SyncWorker {
    engine: Arc<SyncEngine>,
    interval: Duration,
    trigger_rx: mpsc::Receiver<()>,
    shutdown: CancellationToken,
}

impl SyncWorker {
    pub fn new(
        engine: Arc<SyncEngine>,
        interval_secs: u64,
        shutdown: CancellationToken,
    ) -> (Self, SyncTrigger) {
        let (tx, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        (
            Self {
                engine,
                interval: Duration::from_secs(interval_secs),
                trigger_rx,
                shutdown,
            },
            SyncTrigger { tx },
        )
    }

    /// Run the sync worker
    ///
    /// 1. Sync once on startup (first interval tick fires immediately)
    /// 2. Sync on every interval tick and on-demand trigger
    /// 3. Stop on cancellation
    pub async fn run(mut self) {
        info!("SyncWorker started");

        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("SyncWorker shutting down");
                    break;
                }

                _ = interval.tick() => {
                    self.run_once().await;
                }

                Some(_) = self.trigger_rx.recv() => {
                    self.run_once().await;
                }
            }
        }

        info!("SyncWorker stopped");
    }

    async fn run_once(&self) {
        match self.engine.sync().await {
            Ok(summary) if summary.outcome == SyncOutcome::AlreadyRunning => {}
            Ok(summary) => {
                info!(
                    synced = summary.synced,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    outcome = ?summary.outcome,
                    "Sync run finished"
                );
            }
            Err(e) => {
                error!(error = %e, "Sync run failed");
            }
        }
    }
}
