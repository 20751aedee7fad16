//! skidlog receiving-dock server.

use std::sync::Arc;

use anyhow::{Context, Result};
use skidlog::{
    api::{self, AppState},
    config::Config,
    core::serial::SystemClock,
    persist::{RecordStore, sqlite::SqliteRecordStore},
    runtime::handle::spawn_skidlog,
    vendor::VendorDirectory,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // RUST_LOG wins over SKIDLOG_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(listen_addr = %config.listen_addr, db_path = %config.db_path.display(), "configuration loaded");

    let vendors = VendorDirectory::load(&config.vendor_file)
        .with_context(|| format!("loading vendors from {}", config.vendor_file.display()))?;
    info!(vendors = vendors.len(), "vendor directory loaded");

    let store: Box<dyn RecordStore> = if config.in_memory() {
        Box::new(SqliteRecordStore::open_in_memory()?)
    } else {
        Box::new(SqliteRecordStore::open(&config.db_path)?)
    };

    let handle = spawn_skidlog(store, vendors, Arc::new(SystemClock), config.runtime());
    let app = api::create_router(AppState::new(handle.clone()));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening for connections");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received shutdown signal");
        })
        .await;

    if let Err(e) = &served {
        error!(error = %e, "server error");
    }
    if let Err(e) = handle.shutdown().await {
        error!(error = %e, "store shutdown failed");
    }

    info!("skidlog shutdown complete");
    served.map_err(Into::into)
}
