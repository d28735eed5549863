//! Order confirmation state machine
//!
//! The only defined transition is `pending -> confirmed`, and it is
//! terminal. Confirmation validates and deducts stock for every item,
//! allocates the invoice number and persists the invoice in one write
//! transaction; any failure aborts the transaction and leaves no trace.
//!
//! Writers serialize at the store, so two concurrent `confirm` calls for
//! the same order cannot interleave: the second observes the flipped
//! status and fails `InvalidState`, and two orders competing for the
//! last unit of a product cannot both pass the stock check.

use tracing::info;

use super::OrderService;
use crate::store::{Invoice, Order, OrderId, OrderStatus};
use crate::utils::{AppError, AppResult};

impl OrderService {
    /// Transition an order from pending to confirmed
    ///
    /// Returns the updated order together with its invoice. Fails with
    /// `NotFound`, `InvalidState` (not pending) or `InsufficientStock`
    /// (naming the offending product, with no stock deducted for any
    /// item).
    pub fn confirm(&self, order_id: OrderId) -> AppResult<(Order, Invoice)> {
        let txn = self.store.begin_write()?;

        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id}")))?;

        if order.status != OrderStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Order {order_id} is not pending"
            )));
        }

        // A failed deduction aborts the transaction on drop, rolling
        // back deductions already applied for earlier items.
        for item in &order.items {
            self.catalog
                .deduct_stock_txn(&txn, item.product_id, item.quantity)?;
        }

        order.status = OrderStatus::Confirmed;
        self.store.put_order(&txn, &order)?;

        let invoice = self.issue_invoice_txn(&txn, order.id)?;

        txn.commit().map_err(crate::store::StoreError::from)?;

        info!(
            order_id,
            invoice_number = %invoice.invoice_number,
            "Order confirmed, stock deducted"
        );
        Ok((order, invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::super::testkit::{seed_pending_order, seed_product, service_parts, test_service};
    use crate::store::OrderStatus;
    use crate::utils::AppError;
    use chrono::Datelike;

    #[test]
    fn test_confirm_not_found() {
        let service = test_service();
        let err = service.confirm(99).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_confirm_deducts_stock_and_issues_invoice() {
        let service = test_service();
        let (store, catalog) = service_parts(&service);
        let donut = seed_product(&catalog, "Donut", 50.0, 10);
        let order = seed_pending_order(&store, Some("R1"), vec![(donut.id, 2, 50.0)]);

        let (confirmed, invoice) = service.confirm(order.id).unwrap();

        assert_eq!(confirmed.status, OrderStatus::Confirmed);
        assert_eq!(catalog.get(donut.id).unwrap().stock, 8);

        let year = chrono::Utc::now().year();
        assert_eq!(invoice.invoice_number, format!("INV-{year}-0001"));
        assert_eq!(
            store.invoice_for_order(order.id).unwrap().unwrap().id,
            invoice.id
        );
    }

    #[test]
    fn test_confirm_is_terminal() {
        let service = test_service();
        let (store, catalog) = service_parts(&service);
        let donut = seed_product(&catalog, "Donut", 50.0, 10);
        let order = seed_pending_order(&store, None, vec![(donut.id, 1, 50.0)]);

        service.confirm(order.id).unwrap();
        let err = service.confirm(order.id).unwrap_err();
        assert_eq!(err.kind(), "invalid_state");

        // Second attempt left no effect
        assert_eq!(catalog.get(donut.id).unwrap().stock, 9);
        assert_eq!(store.list_invoices().unwrap().len(), 1);
    }

    #[test]
    fn test_insufficient_stock_is_all_or_nothing() {
        let service = test_service();
        let (store, catalog) = service_parts(&service);
        let donut = seed_product(&catalog, "Donut", 50.0, 10);
        let scone = seed_product(&catalog, "Scone", 30.0, 3);
        let order = seed_pending_order(
            &store,
            None,
            vec![(donut.id, 2, 50.0), (scone.id, 5, 30.0)],
        );

        let err = service.confirm(order.id).unwrap_err();
        match err {
            AppError::InsufficientStock { product } => assert_eq!(product, "Scone"),
            other => panic!("unexpected error: {other:?}"),
        }

        // No stock deducted for any item, order still pending, no invoice
        assert_eq!(catalog.get(donut.id).unwrap().stock, 10);
        assert_eq!(catalog.get(scone.id).unwrap().stock, 3);
        let order = store.get_order(order.id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(store.list_invoices().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_confirms_never_oversell() {
        let service = test_service();
        let (store, catalog) = service_parts(&service);
        let last = seed_product(&catalog, "Last Slice", 8.0, 1);
        let first = seed_pending_order(&store, None, vec![(last.id, 1, 8.0)]);
        let second = seed_pending_order(&store, None, vec![(last.id, 1, 8.0)]);

        let mut handles = Vec::new();
        for order_id in [first.id, second.id] {
            let service = service.clone();
            handles.push(std::thread::spawn(move || service.confirm(order_id)));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(AppError::InsufficientStock { product }) if product == "Last Slice"
        )));
        assert_eq!(catalog.get(last.id).unwrap().stock, 0);
    }

    #[test]
    fn test_concurrent_invoice_numbers_are_gapless() {
        let service = test_service();
        let (store, catalog) = service_parts(&service);
        let donut = seed_product(&catalog, "Donut", 50.0, 100);

        let order_ids: Vec<u64> = (0..6)
            .map(|_| seed_pending_order(&store, None, vec![(donut.id, 1, 50.0)]).id)
            .collect();

        let mut handles = Vec::new();
        for order_id in order_ids {
            let service = service.clone();
            handles.push(std::thread::spawn(move || {
                service.confirm(order_id).unwrap().1.invoice_number
            }));
        }
        let mut numbers: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        numbers.sort();

        let year = chrono::Utc::now().year();
        let expected: Vec<String> = (1..=6).map(|n| format!("INV-{year}-{n:04}")).collect();
        assert_eq!(numbers, expected);
    }
}
