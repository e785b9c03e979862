//! # TaskDesk API Server
//!
//! Task management backend: employees authenticate with email and password,
//! then create tasks, move them through their lifecycle, discuss them and
//! log hours against them.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskdesk JWT_SECRET=... cargo run -p taskdesk-api
//! ```

use taskdesk_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use taskdesk_shared::{
    auth::{session::SessionStore, sweeper::SessionSweeper},
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool},
        PgStore,
    },
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskdesk_api=debug,taskdesk_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config::from_env may warn, so tracing goes first
    dotenvy::dotenv().ok();
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LogFormat::Text);
    init_tracing(log_format);

    let config = Config::from_env()?;

    tracing::info!(
        "TaskDesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(config.pool_config()).await?;
    run_migrations(&pool).await?;

    let store = PgStore::new(pool.clone());
    let sweeper = SessionSweeper::new(
        SessionStore::new(Arc::new(store.clone())),
        config.sweeper_config(),
    );
    let addr = config.bind_address();
    let state = AppState::new(store, config)?;
    let app = build_router(state);

    let shutdown = CancellationToken::new();
    let sweeper_handle = sweeper.spawn(shutdown.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, stopping background tasks...");
    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::error!(error = %e, "Session sweeper task failed");
    }
    close_pool(pool).await;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
