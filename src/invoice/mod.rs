//! Invoice sequencer
//!
//! Allocates unique, strictly increasing invoice sequence numbers scoped
//! per calendar year. Allocation is a dedicated counter row incremented
//! inside the caller's write transaction; writers serialize at the store,
//! so concurrent confirmations can never observe the same value, and an
//! aborted confirmation rolls its allocation back leaving no gap.
//!
//! Numbers are deliberately not derived from counting invoice rows.

use redb::WriteTransaction;

use crate::store::LocalStore;
use crate::utils::AppResult;

/// Formatted invoice number: `INV-<4-digit-year>-<4-digit-zero-padded-sequence>`
///
/// This is the sole bit-exact external contract of the engine.
pub fn format_invoice_number(year: i32, sequence: u64) -> String {
    format!("INV-{year}-{sequence:04}")
}

#[derive(Clone)]
pub struct InvoiceSequencer {
    store: LocalStore,
}

impl InvoiceSequencer {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Allocate the next sequence number for the given year
    ///
    /// Must be called inside the transaction that also persists the
    /// invoice, so the allocation commits or aborts with it.
    pub fn allocate(&self, txn: &WriteTransaction, year: i32) -> AppResult<u64> {
        Ok(self.store.next_counter(txn, &counter_key(year))?)
    }

    /// Current sequence for a year without allocating
    pub fn current(&self, year: i32) -> AppResult<u64> {
        Ok(self.store.get_counter(&counter_key(year))?)
    }
}

fn counter_key(year: i32) -> String {
    format!("invoice_seq:{year}")
}
