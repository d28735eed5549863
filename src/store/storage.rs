//! redb-based storage layer for the local authoritative store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | `product_id` | `Product` | Catalog rows |
//! | `product_names` | `name` | `product_id` | Unique name index |
//! | `orders` | `order_id` | `Order` | Orders with embedded items |
//! | `order_remote_ids` | `remote_id` | `order_id` | Idempotency index |
//! | `invoices` | `invoice_id` | `Invoice` | Issued invoices |
//! | `invoice_orders` | `order_id` | `invoice_id` | 1:1 invoice index |
//! | `sync_logs` | `log_id` | `SyncLog` | Append-only run records |
//! | `counters` | `name` | `u64` | ID + invoice sequence counters |
//!
//! # Atomicity
//!
//! redb admits a single write transaction at a time and commits are
//! durable when `commit()` returns. Multi-row operations (confirmation:
//! stock deduction + invoice + status flip) are composed by the services
//! inside one `WriteTransaction`, so either every effect lands or none
//! does, and concurrent writers serialize at the store.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::store::models::{Invoice, Order, Product, SyncLog, SyncStatus};

/// Catalog rows: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Unique name index: key = product name, value = product_id
const PRODUCT_NAMES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("product_names");

/// Orders: key = order_id, value = JSON-serialized Order (items embedded)
const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// Idempotency index: key = remote_id, value = order_id
const ORDER_REMOTE_IDS_TABLE: TableDefinition<&str, u64> =
    TableDefinition::new("order_remote_ids");

/// Invoices: key = invoice_id, value = JSON-serialized Invoice
const INVOICES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("invoices");

/// 1:1 invoice index: key = order_id, value = invoice_id
const INVOICE_ORDERS_TABLE: TableDefinition<u64, u64> = TableDefinition::new("invoice_orders");

/// Sync run records: key = log_id, value = JSON-serialized SyncLog
const SYNC_LOGS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sync_logs");

/// Counters: key = counter name (e.g. "order", "invoice_seq:2024"), value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Local authoritative store backed by redb
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(PRODUCT_NAMES_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_REMOTE_IDS_TABLE)?;
            let _ = write_txn.open_table(INVOICES_TABLE)?;
            let _ = write_txn.open_table(INVOICE_ORDERS_TABLE)?;
            let _ = write_txn.open_table(SYNC_LOGS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is in flight; writers
    /// serialize at the store level.
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters ==========

    /// Increment a named counter and return the new value
    ///
    /// The increment only becomes visible if the caller's transaction
    /// commits, so an aborted operation leaves no gap.
    pub fn next_counter(&self, txn: &WriteTransaction, name: &str) -> StoreResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(name)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(name, next)?;
        Ok(next)
    }

    /// Read a named counter without incrementing
    pub fn get_counter(&self, name: &str) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table.get(name)?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Products ==========

    /// Insert or update a product row and its name index entry
    ///
    /// On rename the caller must first remove the old index entry with
    /// [`remove_product_name`](Self::remove_product_name).
    pub fn put_product(&self, txn: &WriteTransaction, product: &Product) -> StoreResult<()> {
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id, value.as_slice())?;
        }
        let mut names = txn.open_table(PRODUCT_NAMES_TABLE)?;
        names.insert(product.name.as_str(), product.id)?;
        Ok(())
    }

    /// Remove a name index entry (product rename)
    pub fn remove_product_name(&self, txn: &WriteTransaction, name: &str) -> StoreResult<()> {
        let mut names = txn.open_table(PRODUCT_NAMES_TABLE)?;
        names.remove(name)?;
        Ok(())
    }

    /// Delete a product row and its name index entry
    pub fn delete_product(&self, txn: &WriteTransaction, product: &Product) -> StoreResult<()> {
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            table.remove(product.id)?;
        }
        let mut names = txn.open_table(PRODUCT_NAMES_TABLE)?;
        names.remove(product.name.as_str())?;
        Ok(())
    }

    /// Get a product by id
    pub fn get_product(&self, product_id: u64) -> StoreResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a product by id (within transaction)
    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: u64,
    ) -> StoreResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a product by exact name
    pub fn find_product_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(PRODUCT_NAMES_TABLE)?;
        let Some(id) = names.get(name)?.map(|g| g.value()) else {
            return Ok(None);
        };
        drop(names);
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a product by exact name (within transaction)
    pub fn find_product_by_name_txn(
        &self,
        txn: &WriteTransaction,
        name: &str,
    ) -> StoreResult<Option<Product>> {
        let id = {
            let names = txn.open_table(PRODUCT_NAMES_TABLE)?;
            names.get(name)?.map(|g| g.value())
        };
        match id {
            Some(id) => self.get_product_txn(txn, id),
            None => Ok(None),
        }
    }

    /// Get all products, ordered by id
    pub fn list_products(&self) -> StoreResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    // ========== Orders ==========

    /// Insert or update an order row and, if present, its remote-id
    /// index entry
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StoreResult<()> {
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let value = serde_json::to_vec(order)?;
            table.insert(order.id, value.as_slice())?;
        }
        if let Some(remote_id) = &order.remote_id {
            let mut index = txn.open_table(ORDER_REMOTE_IDS_TABLE)?;
            index.insert(remote_id.as_str(), order.id)?;
        }
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: u64) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: u64,
    ) -> StoreResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up an order by its remote identifier (idempotency check)
    pub fn find_order_by_remote_id(&self, remote_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_REMOTE_IDS_TABLE)?;
        let Some(id) = index.get(remote_id)?.map(|g| g.value()) else {
            return Ok(None);
        };
        drop(index);
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all orders, ordered by id
    pub fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    // ========== Invoices ==========

    /// Insert an invoice row and its order index entry (1:1)
    pub fn put_invoice(&self, txn: &WriteTransaction, invoice: &Invoice) -> StoreResult<()> {
        {
            let mut table = txn.open_table(INVOICES_TABLE)?;
            let value = serde_json::to_vec(invoice)?;
            table.insert(invoice.id, value.as_slice())?;
        }
        let mut index = txn.open_table(INVOICE_ORDERS_TABLE)?;
        index.insert(invoice.order_id, invoice.id)?;
        Ok(())
    }

    /// Get an invoice by id
    pub fn get_invoice(&self, invoice_id: u64) -> StoreResult<Option<Invoice>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVOICES_TABLE)?;
        match table.get(invoice_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get the invoice issued for an order, if any
    pub fn invoice_for_order(&self, order_id: u64) -> StoreResult<Option<Invoice>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(INVOICE_ORDERS_TABLE)?;
        let Some(id) = index.get(order_id)?.map(|g| g.value()) else {
            return Ok(None);
        };
        drop(index);
        let table = read_txn.open_table(INVOICES_TABLE)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all invoices, ordered by id (issuance order)
    pub fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INVOICES_TABLE)?;
        let mut invoices = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            invoices.push(serde_json::from_slice(value.value())?);
        }
        Ok(invoices)
    }

    // ========== Sync Logs ==========

    /// Append one sync run record (own transaction, append-only)
    pub fn append_sync_log(
        &self,
        orders_synced: u32,
        status: SyncStatus,
        error_message: Option<String>,
    ) -> StoreResult<SyncLog> {
        let txn = self.begin_write()?;
        let log = {
            let id = self.next_counter(&txn, "sync_log")?;
            let log = SyncLog {
                id,
                timestamp: chrono::Utc::now(),
                orders_synced,
                status,
                error_message,
            };
            let mut table = txn.open_table(SYNC_LOGS_TABLE)?;
            let value = serde_json::to_vec(&log)?;
            table.insert(log.id, value.as_slice())?;
            drop(table);
            log
        };
        txn.commit()?;
        Ok(log)
    }

    /// Get all sync run records, oldest first
    pub fn list_sync_logs(&self) -> StoreResult<Vec<SyncLog>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SYNC_LOGS_TABLE)?;
        let mut logs = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            logs.push(serde_json::from_slice(value.value())?);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{OrderItem, OrderStatus};

    fn test_product(id: u64, name: &str, stock: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price: 2.5,
            description: None,
            image_url: None,
            stock,
            unit: None,
            is_active: true,
        }
    }

    fn test_order(id: u64, remote_id: Option<&str>) -> Order {
        Order {
            id,
            remote_id: remote_id.map(|s| s.to_string()),
            customer_name: "Alice".to_string(),
            phone: "555-0100".to_string(),
            total: 10.0,
            status: OrderStatus::Pending,
            created_at: chrono::Utc::now(),
            items: vec![OrderItem {
                product_id: 1,
                quantity: 2,
                unit_price: 5.0,
            }],
        }
    }

    #[test]
    fn test_counter_increment() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get_counter("order").unwrap(), 0);

        let txn = store.begin_write().unwrap();
        let first = store.next_counter(&txn, "order").unwrap();
        txn.commit().unwrap();
        assert_eq!(first, 1);

        let txn = store.begin_write().unwrap();
        let second = store.next_counter(&txn, "order").unwrap();
        txn.commit().unwrap();
        assert_eq!(second, 2);
        assert_eq!(store.get_counter("order").unwrap(), 2);
    }

    #[test]
    fn test_counter_rolls_back_on_abort() {
        let store = LocalStore::open_in_memory().unwrap();

        let txn = store.begin_write().unwrap();
        let value = store.next_counter(&txn, "order").unwrap();
        assert_eq!(value, 1);
        txn.abort().unwrap();

        // Aborted increment leaves no gap
        assert_eq!(store.get_counter("order").unwrap(), 0);
        let txn = store.begin_write().unwrap();
        assert_eq!(store.next_counter(&txn, "order").unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn test_product_name_index() {
        let store = LocalStore::open_in_memory().unwrap();
        let product = test_product(1, "Donut", 10);

        let txn = store.begin_write().unwrap();
        store.put_product(&txn, &product).unwrap();
        txn.commit().unwrap();

        let found = store.find_product_by_name("Donut").unwrap();
        assert_eq!(found.map(|p| p.id), Some(1));
        assert!(store.find_product_by_name("Croissant").unwrap().is_none());
    }

    #[test]
    fn test_product_rename_updates_index() {
        let store = LocalStore::open_in_memory().unwrap();
        let mut product = test_product(1, "Donut", 10);

        let txn = store.begin_write().unwrap();
        store.put_product(&txn, &product).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_write().unwrap();
        store.remove_product_name(&txn, "Donut").unwrap();
        product.name = "Glazed Donut".to_string();
        store.put_product(&txn, &product).unwrap();
        txn.commit().unwrap();

        assert!(store.find_product_by_name("Donut").unwrap().is_none());
        assert_eq!(
            store
                .find_product_by_name("Glazed Donut")
                .unwrap()
                .map(|p| p.id),
            Some(1)
        );
    }

    #[test]
    fn test_order_remote_id_index() {
        let store = LocalStore::open_in_memory().unwrap();
        let order = test_order(1, Some("R1"));

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        let found = store.find_order_by_remote_id("R1").unwrap();
        assert_eq!(found.map(|o| o.id), Some(1));
        assert!(store.find_order_by_remote_id("R2").unwrap().is_none());
    }

    #[test]
    fn test_manual_order_has_no_remote_index_entry() {
        let store = LocalStore::open_in_memory().unwrap();
        let order = test_order(1, None);

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();

        assert_eq!(store.list_orders().unwrap().len(), 1);
    }

    #[test]
    fn test_invoice_order_index() {
        let store = LocalStore::open_in_memory().unwrap();
        let invoice = Invoice {
            id: 1,
            order_id: 7,
            invoice_number: "INV-2024-0001".to_string(),
            created_at: chrono::Utc::now(),
        };

        let txn = store.begin_write().unwrap();
        store.put_invoice(&txn, &invoice).unwrap();
        txn.commit().unwrap();

        let found = store.invoice_for_order(7).unwrap().unwrap();
        assert_eq!(found.invoice_number, "INV-2024-0001");
        assert!(store.invoice_for_order(8).unwrap().is_none());
    }

    #[test]
    fn test_sync_log_append_only() {
        let store = LocalStore::open_in_memory().unwrap();

        store.append_sync_log(3, SyncStatus::Success, None).unwrap();
        store
            .append_sync_log(0, SyncStatus::Failure, Some("fetch failed".to_string()))
            .unwrap();

        let logs = store.list_sync_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].orders_synced, 3);
        assert_eq!(logs[0].status, SyncStatus::Success);
        assert_eq!(logs[1].status, SyncStatus::Failure);
        assert_eq!(logs[1].error_message.as_deref(), Some("fetch failed"));
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treats.db");

        {
            let store = LocalStore::open(&path).unwrap();
            let txn = store.begin_write().unwrap();
            store.put_product(&txn, &test_product(1, "Donut", 10)).unwrap();
            store.next_counter(&txn, "invoice_seq:2024").unwrap();
            txn.commit().unwrap();
        }

        let store = LocalStore::open(&path).unwrap();
        assert_eq!(
            store.find_product_by_name("Donut").unwrap().map(|p| p.id),
            Some(1)
        );
        assert_eq!(store.get_counter("invoice_seq:2024").unwrap(), 1);
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let store = LocalStore::open_in_memory().unwrap();
        let order = test_order(1, Some("R1"));

        let txn = store.begin_write().unwrap();
        store.put_order(&txn, &order).unwrap();
        txn.abort().unwrap();

        assert!(store.get_order(1).unwrap().is_none());
        assert!(store.find_order_by_remote_id("R1").unwrap().is_none());
    }
}
