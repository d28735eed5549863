//! Manual order creation
//!
//! Alternate ingress that builds an order directly from caller-supplied
//! data and immediately issues its invoice. Applies the same
//! stock-sufficiency and atomicity guarantees as confirmation: the whole
//! request is rejected if any item is under-stocked, and stock
//! deduction, order creation and invoice issuance commit as one unit.

use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::OrderService;
use crate::store::{Invoice, Order, OrderItem, OrderStatus, ProductId};
use crate::utils::{AppError, AppResult};

/// Typed manual-order request; unknown fields are rejected
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManualOrderRequest {
    #[validate(length(min = 1, message = "Customer name must not be empty"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Phone must not be empty"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate(nested)]
    pub items: Vec<ManualOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ManualOrderItem {
    pub product_id: ProductId,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: u32,
}

impl OrderService {
    /// Create an order directly (no remote source involved) and issue
    /// its invoice
    ///
    /// The unit price of each item is captured from the current catalog
    /// price; the order total is computed from the items. The created
    /// order is already confirmed.
    pub fn create_manual_order(&self, req: ManualOrderRequest) -> AppResult<(Order, Invoice)> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let txn = self.store.begin_write()?;

        let mut items = Vec::with_capacity(req.items.len());
        let mut total = 0.0;
        for entry in &req.items {
            let product = self
                .store
                .get_product_txn(&txn, entry.product_id)?
                .ok_or_else(|| AppError::NotFound(format!("Product {}", entry.product_id)))?;

            self.catalog
                .deduct_stock_txn(&txn, product.id, entry.quantity)?;

            total += product.price * f64::from(entry.quantity);
            items.push(OrderItem {
                product_id: product.id,
                quantity: entry.quantity,
                unit_price: product.price,
            });
        }

        let order = Order {
            id: self.store.next_counter(&txn, "order")?,
            remote_id: None,
            customer_name: req.customer_name,
            phone: req.phone,
            total,
            status: OrderStatus::Confirmed,
            created_at: chrono::Utc::now(),
            items,
        };
        self.store.put_order(&txn, &order)?;

        let invoice = self.issue_invoice_txn(&txn, order.id)?;

        txn.commit().map_err(crate::store::StoreError::from)?;

        info!(
            order_id = order.id,
            invoice_number = %invoice.invoice_number,
            "Manual order created"
        );
        Ok((order, invoice))
    }
}
