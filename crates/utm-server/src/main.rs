//! UTM Server - flight-request decisions and airspace data over HTTP

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utm_server::config::Config;
use utm_server::state::AppState;
use utm_server::{api, loops, persistence};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("utm_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting UTM Server...");

    let config = Config::from_env();
    let port = config.server_port;
    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await?;
    let state = Arc::new(AppState::new(db, config));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    if state.config().ingest_enabled {
        loops::ingest_loop::spawn_ingest_loops(state.clone(), &shutdown_tx);
    } else {
        tracing::info!("Zone ingestion disabled");
    }

    let app = api::routes()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("UTM backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
                return;
            }
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(());
        })
        .await?;

    Ok(())
}
