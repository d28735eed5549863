//! Remote order reconciliation
//!
//! [`SyncEngine`] pulls pending orders from the remote source and merges
//! them into the local store exactly once; [`SyncWorker`] drives it
//! periodically and on demand.

pub mod engine;
pub mod worker;

pub use engine::{SyncEngine, SyncOutcome, SyncSummary};
pub use worker::{SyncTrigger, SyncWorker};
