use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use treats_edge::{Config, ServerState, SyncWorker, init_logger, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_logger();
    print_banner();

    tracing::info!("Treats Edge starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config)?;

    let shutdown = CancellationToken::new();
    let worker_handle = state.sync_engine.as_ref().map(|engine| {
        let (worker, _trigger) =
            SyncWorker::new(Arc::clone(engine), config.sync_interval_secs, shutdown.clone());
        tokio::spawn(worker.run())
    });

    tracing::info!(
        products = state.catalog.list().map(|p| p.len()).unwrap_or(0),
        environment = %config.environment,
        "Treats Edge ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }

    Ok(())
}
