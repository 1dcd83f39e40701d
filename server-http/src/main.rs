use quartz::{MetadataLedger, ObjectStore, Reaper, ReaperConfig};
use server_http::{build_router, AppState};
use shared::config::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Quartz cache server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();

    let store = Arc::new(
        ObjectStore::new(&config.data_dir).expect("Failed to initialize object store"),
    );
    let ledger = Arc::new(MetadataLedger::new(&config.data_dir));

    // The reaper owns its own task for the whole process lifetime
    let reaper = Reaper::new(
        store.clone(),
        ledger.clone(),
        ReaperConfig {
            retention: config.retention,
            sweep_interval: config.sweep_interval,
        },
    );
    let reaper_handle = reaper.spawn();

    let state = AppState::new(store, ledger);
    let router = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("HTTP server listening on http://{}", addr);
    info!("Try: curl -X PUT --data-binary @file http://{}/cache/mykey", addr);

    // Graceful shutdown handler
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    reaper_handle.shutdown().await;
    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
