//! Remote order source
//!
//! External collaborator interface consumed by the sync engine: fetch
//! pending remote orders, mark a remote order as synced. Retry policy is
//! the caller's responsibility; this layer only classifies failures as
//! `AppError::Remote`.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::AppResult;

pub use client::HttpRemoteSource;

/// One line entry of a remote order; resolved against the local catalog
/// by exact product name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Order as delivered by the remote system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteOrder {
    /// Remote identifier, becomes the local idempotency key
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    /// Pass-through, not recomputed on ingestion
    pub total_price: f64,
    /// ISO-8601 timestamp, normalized to UTC on ingestion
    pub created_at: String,
    pub items: Vec<RemoteOrderItem>,
}

/// External order source consumed by the sync engine
#[async_trait]
pub trait RemoteOrderSource: Send + Sync {
    /// Fetch the batch of remote orders still pending local reconciliation
    async fn fetch_pending(&self) -> AppResult<Vec<RemoteOrder>>;

    /// Mark a remote order as synced
    ///
    /// Idempotent: marking the same identifier twice has no additional
    /// effect. On failure the caller must not assume the remote state
    /// changed.
    async fn mark_synced(&self, remote_id: &str) -> AppResult<()>;
}
