//! Order lifecycle services
//!
//! [`OrderService`] owns the pending→confirmed transition and the manual
//! ingress path. Both paths share the same guarantee: stock deduction,
//! invoice issuance and the status flip commit as one write transaction
//! or not at all.

pub mod confirm;
pub mod manual;

use chrono::Datelike;
use redb::WriteTransaction;

use crate::catalog::ProductCatalog;
use crate::invoice::{InvoiceSequencer, format_invoice_number};
use crate::store::{Invoice, LocalStore, OrderId};
use crate::utils::AppResult;

pub use manual::{ManualOrderItem, ManualOrderRequest};

#[derive(Clone)]
pub struct OrderService {
    store: LocalStore,
    catalog: ProductCatalog,
    sequencer: InvoiceSequencer,
}

impl OrderService {
    pub fn new(store: LocalStore, catalog: ProductCatalog, sequencer: InvoiceSequencer) -> Self {
        Self {
            store,
            catalog,
            sequencer,
        }
    }

    /// Allocate and persist the invoice for an order within the caller's
    /// transaction
    fn issue_invoice_txn(&self, txn: &WriteTransaction, order_id: OrderId) -> AppResult<Invoice> {
        let now = chrono::Utc::now();
        let year = now.year();
        let sequence = self.sequencer.allocate(txn, year)?;
        let invoice = Invoice {
            id: self.store.next_counter(txn, "invoice")?,
            order_id,
            invoice_number: format_invoice_number(year, sequence),
            created_at: now,
        };
        self.store.put_invoice(txn, &invoice)?;
        Ok(invoice)
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    use super::*;
    use crate::store::{Order, OrderItem, OrderStatus, Product, ProductCreate, ProductId};

    pub fn test_service() -> OrderService {
        let store = LocalStore::open_in_memory().unwrap();
        let catalog = ProductCatalog::new(store.clone());
        let sequencer = InvoiceSequencer::new(store.clone());
        OrderService::new(store, catalog, sequencer)
    }

    pub fn service_parts(service: &OrderService) -> (LocalStore, ProductCatalog) {
        (service.store.clone(), service.catalog.clone())
    }

    pub fn seed_product(catalog: &ProductCatalog, name: &str, price: f64, stock: i64) -> Product {
        catalog
            .create(ProductCreate {
                name: name.to_string(),
                price,
                description: None,
                image_url: None,
                stock: Some(stock),
                unit: None,
            })
            .unwrap()
    }

    pub fn seed_pending_order(
        store: &LocalStore,
        remote_id: Option<&str>,
        items: Vec<(ProductId, u32, f64)>,
    ) -> Order {
        let txn = store.begin_write().unwrap();
        let order = Order {
            id: store.next_counter(&txn, "order").unwrap(),
            remote_id: remote_id.map(|s| s.to_string()),
            customer_name: "Alice".to_string(),
            phone: "555-0100".to_string(),
            total: items
                .iter()
                .map(|(_, qty, price)| f64::from(*qty) * price)
                .sum(),
            status: OrderStatus::Pending,
            created_at: chrono::Utc::now(),
            items: items
                .into_iter()
                .map(|(product_id, quantity, unit_price)| OrderItem {
                    product_id,
                    quantity,
                    unit_price,
                })
                .collect(),
        };
        store.put_order(&txn, &order).unwrap();
        txn.commit().unwrap();
        order
    }
}
