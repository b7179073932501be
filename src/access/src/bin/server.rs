//! # Access HTTP Server
//!
//! Serves the storefront role catalog, session role resolution and the
//! staff-management endpoints.
//!
//! ## Configuration
//!
//! - `ACCESS_CONFIG` - Optional TOML file, read before the overrides below
//! - `ACCESS_HOST` / `ACCESS_PORT` - Listen address (default: 0.0.0.0:8080)
//! - `ACCESS_RESOLVE_TIMEOUT_MS` - Role fetch deadline (default: 5000)
//! - `ACCESS_STORE_BACKEND` - `memory` or `postgres` (default: memory)
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::Context;
use std::sync::Arc;
use storefront_access::config::{AccessConfig, StoreBackend};
use storefront_access::http::{create_router, AppState};
use storefront_access::store::InMemoryAccessStore;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn load_config() -> anyhow::Result<AccessConfig> {
    let mut config = match std::env::var("ACCESS_CONFIG") {
        Ok(path) => AccessConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        Err(_) => AccessConfig::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

async fn build_state(config: &AccessConfig) -> anyhow::Result<AppState> {
    let timeout = config.resolve_timeout();

    match config.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; grants are lost on restart");
            Ok(AppState::new(Arc::new(InMemoryAccessStore::new()), timeout))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            use storefront_access::store::PostgresAccessStore;

            let url = config
                .store
                .database_url
                .as_deref()
                .context("store.database_url is required for the postgres backend")?;

            let store = PostgresAccessStore::new(url, config.store.max_connections).await?;
            store.run_migrations().await?;
            info!("Connected to PostgreSQL store");

            Ok(AppState::new(Arc::new(store), timeout))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            anyhow::bail!("this build does not include the postgres backend")
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("Starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.log_filter)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting storefront access server v{}", storefront_access::VERSION);
    info!("Configuration:");
    info!("  Listen: {}", config.listen_addr());
    info!("  Store: {:?}", config.store.backend);
    info!("  Resolve timeout: {:?}", config.resolve_timeout());

    let state = build_state(&config).await?;
    let app = create_router(state, config.server.cors_enabled);

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;

    info!("HTTP server listening on {}", config.listen_addr());

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server shutdown complete");
    Ok(())
}
