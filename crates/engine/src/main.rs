//! villagemc engine: event consumer, job processor, and query API in one
//! process, mirroring the teacher's single-binary worker+server shape.

mod api;
mod application;
mod config;
mod domain;
mod error;
mod infrastructure;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::infrastructure::bus::RedisEventBus;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "villagemc_engine=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting villagemc engine");

    let config = AppConfig::from_env()?;
    tracing::info!(rcon_host = %config.rcon.host, bus_url = %config.bus_url, "configuration loaded");

    let bus = Arc::new(RedisEventBus::connect(&config.bus_url)?);
    let state = Arc::new(AppState::new(&config, bus).await?);

    let shutdown = tokio_util::sync::CancellationToken::new();

    let consumer_task = {
        let state = state.clone();
        let bus_url = config.bus_url.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = application::consumer::run_consumer(state, bus_url, shutdown).await {
                tracing::error!(error = %e, "event consumer exited with error");
            }
        })
    };

    let processor_task = {
        let state = state.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            application::processor::run_processor(state, shutdown).await;
        })
    };

    let app = api::http::routes(state.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping background tasks");
            shutdown.cancel();
            consumer_task.abort();
            processor_task.abort();
        }
    }

    Ok(())
}
