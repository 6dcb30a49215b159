//! HTTP admin gateway for keyrelay.
//!
//! Exposes the channel administration API under `/api/channel` plus a
//! health check. Built on Axum.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use keyrelay_channels::ChannelService;
use keyrelay_config::AppConfig;
use keyrelay_core::error::{Error, Result};
use keyrelay_core::store::ChannelStore;
use keyrelay_store::{InMemoryChannelStore, SqliteChannelStore};

/// Shared application state for the gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub channels: ChannelService,
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: GatewayState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(api::channel_router(state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Open the configured channel store and wrap it in a service.
///
/// Shared by the gateway and the CLI so both see the same database.
pub async fn open_service(config: &AppConfig) -> Result<ChannelService> {
    let store: Arc<dyn ChannelStore> = match config.database.backend.as_str() {
        "memory" => Arc::new(InMemoryChannelStore::new()),
        "sqlite" => {
            let path = config.database.sqlite_path();
            if !path.contains(":memory:")
                && let Some(parent) = std::path::Path::new(&path).parent()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Internal(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
            Arc::new(
                SqliteChannelStore::with_max_connections(&path, config.database.max_connections)
                    .await?,
            )
        }
        other => {
            return Err(Error::Config {
                message: format!("unknown database backend \"{other}\""),
            });
        }
    };

    info!(backend = store.name(), "Channel store ready");
    Ok(ChannelService::new(store, config.channels.items_per_page))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let channels = open_service(&config).await?;
    let app = build_router(GatewayState { channels }, config.gateway.max_body_bytes);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
