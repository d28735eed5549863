//! Server state — shared handles for all services
//!
//! `ServerState` wires the store, catalog, sequencer and order services
//! together and is cheaply cloneable (every service shares the same
//! underlying store handle). There is no process-wide singleton: the
//! store handle is passed explicitly into every service.

use std::sync::Arc;
use tracing::warn;

use crate::catalog::ProductCatalog;
use crate::core::Config;
use crate::invoice::InvoiceSequencer;
use crate::orders::OrderService;
use crate::remote::HttpRemoteSource;
use crate::store::LocalStore;
use crate::sync::SyncEngine;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: LocalStore,
    pub catalog: ProductCatalog,
    pub orders: OrderService,
    /// Present only when the remote source is configured
    pub sync_engine: Option<Arc<SyncEngine>>,
}

impl ServerState {
    /// Initialize all services
    ///
    /// Creates the working directory layout, opens the database and
    /// wires the services. The sync engine is only built when both
    /// REMOTE_URL and REMOTE_API_KEY are configured.
    pub fn initialize(config: &Config) -> AppResult<Self> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::Persistence(format!("Failed to create work dir: {e}")))?;

        let store = LocalStore::open(config.database_path())?;
        let catalog = ProductCatalog::new(store.clone());
        let sequencer = InvoiceSequencer::new(store.clone());
        let orders = OrderService::new(store.clone(), catalog.clone(), sequencer);

        let sync_engine = match (&config.remote_url, &config.remote_api_key) {
            (Some(url), Some(key)) => {
                let remote = Arc::new(HttpRemoteSource::new(url.clone(), key.clone())?);
                Some(Arc::new(SyncEngine::new(
                    store.clone(),
                    catalog.clone(),
                    remote,
                )))
            }
            _ => {
                warn!("Remote source not configured, order sync disabled");
                None
            }
        };

        Ok(Self {
            config: config.clone(),
            store,
            catalog,
            orders,
            sync_engine,
        })
    }
}
