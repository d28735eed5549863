//! Local authoritative store
//!
//! Persisted products, orders, invoices and sync logs, backed by redb.
//! All lifecycle mutation goes through [`LocalStore`] write transactions;
//! the catalog and order services are the only writers.

pub mod models;
pub mod storage;

pub use models::{
    Invoice, InvoiceId, Order, OrderId, OrderItem, OrderStatus, Product, ProductCreate, ProductId,
    ProductUpdate, SyncLog, SyncStatus,
};
pub use storage::{LocalStore, StoreError, StoreResult};
