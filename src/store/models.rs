//! Persisted data models
//!
//! All models are JSON-serialized into redb tables. Identity is a plain
//! `u64` allocated from the store's counter table; remote identity (the
//! idempotency key for synced orders) lives in a separate unique index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProductId = u64;
pub type OrderId = u64;
pub type InvoiceId = u64;

/// Product model
///
/// Invariant: `stock` never goes below zero in any committed state.
/// Stock is mutated exclusively through the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique display name, used for remote line-entry resolution
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i64,
    /// e.g. "Pack of 4"
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
}

/// Order lifecycle state
///
/// The only defined transition is `Pending -> Confirmed`; there is no
/// path back once an order has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
}

/// Order line item
///
/// `unit_price` is captured at order time and may differ from the
/// current catalog price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Local order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Remote order identifier; unique when present (idempotency key).
    /// `None` for manually created orders.
    pub remote_id: Option<String>,
    pub customer_name: String,
    pub phone: String,
    /// Pass-through from the remote source, not recomputed by sync
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Invoice, 1:1 with a confirmed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order_id: OrderId,
    /// `INV-<year>-<4-digit sequence>`, globally unique
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failure,
}

/// One record per sync run, append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub orders_synced: u32,
    pub status: SyncStatus,
    pub error_message: Option<String>,
}
