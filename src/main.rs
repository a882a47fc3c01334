// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mikrotik_dashboard::{
    AppState, Config, Dashboard, DeviceRepository, JsonFileStore, MikroTikClient, Result,
    create_router,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();
    tracing::info!(
        "RouterOS ports {:?}, connect timeout {}s, command timeout {}s",
        config.routeros.fallback_ports,
        config.routeros.connect_timeout_secs,
        config.routeros.command_timeout_secs
    );

    let store = Arc::new(JsonFileStore::new(&config.devices_db));
    let devices = store.load_devices().await.map_err(|e| {
        tracing::error!("Cannot open device store {}: {}", config.devices_db, e);
        e
    })?;
    tracing::info!(
        "Loaded {} server(s) from {}",
        devices.len(),
        store.path().display()
    );

    let client = MikroTikClient::new(&config.routeros);
    let state = Arc::new(AppState {
        dashboard: Dashboard::new(store, client),
    });

    // Graceful shutdown channel
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("MikroTik Dashboard starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health                        - Health check");
    tracing::info!("  - GET  /api/servers                   - Servers with live status");
    tracing::info!("  - GET  /api/servers/{{id}}/pppoe        - Active PPPoE users");
    tracing::info!("  - GET  /api/servers/{{id}}/interfaces   - Interface rates");
    tracing::info!("  - GET  /api/servers/{{id}}/traffic      - Traffic series");
    tracing::info!("  - GET  /api/servers/{{id}}/resources    - CPU and memory series");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    Ok(())
}

fn setup_tracing() {
    // RUST_LOG wins; "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
