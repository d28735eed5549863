//! SyncEngine — exactly-once reconciliation of remote orders
//!
//! # Run semantics
//!
//! 1. Fetch the pending batch; a fetch failure aborts the whole run and
//!    records a failure SyncLog.
//! 2. Each remote order is processed independently; one bad order never
//!    blocks the rest of the batch.
//! 3. Exactly one SyncLog record summarizes the run.
//!
//! # Idempotency and healing
//!
//! The remote identifier is the idempotency key: an order that already
//! exists locally is never recreated, but `mark_synced` is re-attempted
//! for it so a prior partial failure (local write committed, remote
//! update lost) heals on the next run. The symmetric partial failure
//! (remote marked, local write lost) cannot occur because the local
//! commit happens first.
//!
//! Runs are single-flight: a trigger arriving while a run is in flight
//! coalesces into a no-op.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::ProductCatalog;
use crate::remote::{RemoteOrder, RemoteOrderSource};
use crate::store::{LocalStore, Order, OrderItem, OrderStatus, SyncStatus};
use crate::utils::{AppError, AppResult};

/// Overall outcome of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    Failure,
    /// Trigger coalesced into an in-flight run; nothing was done
    AlreadyRunning,
}

/// Summary returned by [`SyncEngine::sync`]
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Newly created local orders
    pub synced: u32,
    /// Remote orders that already existed locally
    pub skipped: u32,
    /// Remote orders whose processing failed (isolated, logged)
    pub failed: u32,
    pub outcome: SyncOutcome,
    pub error: Option<String>,
}

impl SyncSummary {
    fn already_running() -> Self {
        Self {
            synced: 0,
            skipped: 0,
            failed: 0,
            outcome: SyncOutcome::AlreadyRunning,
            error: None,
        }
    }
}

pub struct SyncEngine {
    store: LocalStore,
    catalog: ProductCatalog,
    remote: Arc<dyn RemoteOrderSource>,
    run_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        store: LocalStore,
        catalog: ProductCatalog,
        remote: Arc<dyn RemoteOrderSource>,
    ) -> Self {
        Self {
            store,
            catalog,
            remote,
            run_lock: Mutex::new(()),
        }
    }

    /// Run one reconciliation pass
    ///
    /// Returns the run summary. Remote failures surface in the summary
    /// (and the SyncLog), not as an `Err`; only local persistence
    /// failures around the run itself propagate.
    pub async fn sync(&self) -> AppResult<SyncSummary> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            debug!("Sync already in flight, trigger coalesced");
            return Ok(SyncSummary::already_running());
        };

        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "Starting sync run");

        let batch = match self.remote.fetch_pending().await {
            Ok(batch) => batch,
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "Fetching pending remote orders failed, aborting run");
                self.store
                    .append_sync_log(0, SyncStatus::Failure, Some(message.clone()))?;
                return Ok(SyncSummary {
                    synced: 0,
                    skipped: 0,
                    failed: 0,
                    outcome: SyncOutcome::Failure,
                    error: Some(message),
                });
            }
        };

        let mut synced = 0u32;
        let mut skipped = 0u32;
        let mut failed = 0u32;

        for remote_order in batch {
            let remote_id = remote_order.id.clone();
            match self.process_remote_order(remote_order).await {
                Ok(true) => synced += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    failed += 1;
                    error!(remote_id = %remote_id, error = %e, "Failed to sync remote order");
                }
            }
        }

        self.store.append_sync_log(synced, SyncStatus::Success, None)?;
        info!(run_id = %run_id, synced, skipped, failed, "Sync run complete");

        Ok(SyncSummary {
            synced,
            skipped,
            failed,
            outcome: SyncOutcome::Success,
            error: None,
        })
    }

    /// Process one remote order; returns whether a local order was created
    async fn process_remote_order(&self, remote: RemoteOrder) -> AppResult<bool> {
        // Idempotency check. Re-attempt mark_synced for an existing
        // order so a prior partial failure heals on this run.
        if self.store.find_order_by_remote_id(&remote.id)?.is_some() {
            if let Err(e) = self.remote.mark_synced(&remote.id).await {
                warn!(
                    remote_id = %remote.id,
                    error = %e,
                    "Healing mark_synced failed, will retry next run"
                );
            }
            return Ok(false);
        }

        let created_at = parse_created_at(&remote.created_at)?;

        let txn = self.store.begin_write()?;

        // Best-effort item resolution: an unmatched line entry is
        // skipped, it does not abort the rest of the order.
        let mut items = Vec::with_capacity(remote.items.len());
        for entry in &remote.items {
            match self.catalog.find_by_name_txn(&txn, &entry.name)? {
                Some(product) => items.push(OrderItem {
                    product_id: product.id,
                    quantity: entry.quantity,
                    unit_price: entry.price,
                }),
                None => warn!(
                    remote_id = %remote.id,
                    product = %entry.name,
                    "Unmatched line entry skipped"
                ),
            }
        }

        let order = Order {
            id: self.store.next_counter(&txn, "order")?,
            remote_id: Some(remote.id.clone()),
            customer_name: remote.customer_name,
            phone: remote.phone,
            total: remote.total_price,
            status: OrderStatus::Pending,
            created_at,
            items,
        };
        self.store.put_order(&txn, &order)?;
        txn.commit().map_err(crate::store::StoreError::from)?;

        info!(remote_id = %remote.id, order_id = order.id, "Remote order reconciled");

        // The local order is durably committed at this point; a failed
        // remote update is healed by the idempotency path next run.
        if let Err(e) = self.remote.mark_synced(&remote.id).await {
            warn!(
                remote_id = %remote.id,
                error = %e,
                "Local order committed but mark_synced failed, will heal next run"
            );
        }

        Ok(true)
    }
}

fn parse_created_at(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("Invalid created_at '{raw}': {e}")))
}
