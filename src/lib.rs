//! Treats Edge — local order reconciliation and inventory engine
//!
//! Ingests orders placed in a remote storefront, reconciles them
//! exactly-once into the local authoritative store, and governs the
//! pending→confirmed transition by atomically reserving inventory and
//! issuing a unique invoice number.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # configuration, server state
//! ├── utils/         # error taxonomy, logging
//! ├── store/         # redb-backed local store + models
//! ├── catalog/       # product catalog, exclusive stock owner
//! ├── invoice/       # per-year invoice sequencer
//! ├── remote/        # remote order source interface + HTTP adapter
//! ├── sync/          # reconciliation engine + background worker
//! └── orders/        # confirmation state machine, manual ingress
//! ```

pub mod catalog;
pub mod core;
pub mod invoice;
pub mod orders;
pub mod remote;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export public types
pub use catalog::ProductCatalog;
pub use crate::core::{Config, ServerState};
pub use invoice::{InvoiceSequencer, format_invoice_number};
pub use orders::{ManualOrderItem, ManualOrderRequest, OrderService};
pub use remote::{HttpRemoteSource, RemoteOrder, RemoteOrderSource};
pub use store::{LocalStore, Order, OrderStatus, Product};
pub use sync::{SyncEngine, SyncOutcome, SyncSummary, SyncTrigger, SyncWorker};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
  ______                __
 /_  __/_______  ____ _/ /______
  / / / ___/ _ \/ __ `/ __/ ___/
 / / / /  /  __/ /_/ / /_(__  )
/_/ /_/   \___/\__,_/\__/____/
    ______    __
   / ____/___/ /___ ____
  / __/ / __  / __ `/ _ \
 / /___/ /_/ / /_/ /  __/
/_____/\__,_/\__, /\___/
            /____/
    "#
    );
}
