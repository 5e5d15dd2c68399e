mod advice;
mod aggregate;
mod api;
mod config;
mod constants;
mod geocode;
mod http_client;
mod merge;
mod params;
mod providers;
mod session;
mod severity;
#[cfg(test)]
mod test_support;
mod types;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::constants::{CONNECT_TIMEOUT_SECONDS, MAX_CLIENT_SESSIONS, USER_AGENT};
use crate::merge::AirQualityService;
use crate::session::ClientSessions;
use crate::types::AppState;
use crate::utils::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Arc::new(Config::from_env()?);

    let http = Client::builder()
        .timeout(cfg.request_timeout)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build reqwest client")?;

    let service = AirQualityService::from_config(http, &cfg);
    info!(
        "Current readings from {} with fallback to {}",
        service.primary_name().unwrap_or("(no primary)"),
        service.secondary_name()
    );

    let state = AppState {
        cfg: cfg.clone(),
        service: Arc::new(service),
        sessions: Arc::new(ClientSessions::new(MAX_CLIENT_SESSIONS)),
    };

    let app = api::router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;

    info!("airq-map listening on http://{}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
