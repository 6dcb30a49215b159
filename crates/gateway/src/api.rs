//! Channel administration API.
//!
//! Endpoints:
//!
//! - `GET    /api/channel/?p=N`                         — One page of channels
//! - `GET    /api/channel/search?keyword=K`             — Search by id or name prefix
//! - `GET    /api/channel/export?scope=S&include_key=B` — Bulk export
//! - `POST   /api/channel/import`                       — Bulk import
//! - `GET    /api/channel/{id}`                         — One channel
//! - `POST   /api/channel/`                             — Add (one channel per key line)
//! - `PUT    /api/channel/`                             — Full update
//! - `DELETE /api/channel/disabled`                     — Delete every disabled channel
//! - `DELETE /api/channel/{id}`                         — Delete one channel
//!
//! Every response is HTTP 200 with a `{success, message, data}` envelope.
//! Malformed bodies, paths and queries are reported the same way.

use axum::{
    Router,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use keyrelay_channels::{ExportView, ImportItem, ImportSummary};
use keyrelay_core::channel::{ChannelRecord, Scope};
use keyrelay_core::error::{Error, Result};

use crate::GatewayState;

/// Response envelope shared by every channel endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            message: String::new(),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

type Reply<T> = Json<ApiResponse<T>>;

fn reply<T>(result: Result<T>) -> Reply<T> {
    Json(match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => {
            warn!(error = %e, "Channel request failed");
            ApiResponse::failure(e.to_string())
        }
    })
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| Error::MalformedInput(format!("invalid channel id '{raw}'")))
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::MalformedInput(rejection.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|rejection| Error::MalformedInput(rejection.body_text()))
}

pub fn channel_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/api/channel/",
            get(list_handler).post(add_handler).put(update_handler),
        )
        .route("/api/channel/search", get(search_handler))
        .route("/api/channel/export", get(export_handler))
        .route("/api/channel/import", post(import_handler))
        .route("/api/channel/disabled", delete(delete_disabled_handler))
        .route(
            "/api/channel/{id}",
            get(get_handler).delete(delete_handler),
        )
        .with_state(state)
}

// ── Query parameters ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    p: Option<String>,
}

impl ListParams {
    /// Missing, non-numeric and negative pages all read as page 0.
    fn page(&self) -> i64 {
        self.p
            .as_deref()
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(0)
            .max(0)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    keyword: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExportParams {
    #[serde(default)]
    scope: String,
    #[serde(default)]
    include_key: Option<String>,
}

impl ExportParams {
    fn include_key(&self) -> bool {
        self.include_key.as_deref() == Some("true")
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_handler(
    State(state): State<GatewayState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Reply<Vec<ChannelRecord>> {
    let result = match query(params) {
        Ok(params) => state.channels.list(params.page()).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn search_handler(
    State(state): State<GatewayState>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Reply<Vec<ChannelRecord>> {
    let result = match query(params) {
        Ok(params) => state.channels.search(&params.keyword).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn export_handler(
    State(state): State<GatewayState>,
    params: std::result::Result<Query<ExportParams>, QueryRejection>,
) -> Reply<Vec<ExportView>> {
    let result = match query(params) {
        Ok(params) => {
            let scope = Scope::parse(&params.scope);
            state.channels.export(scope, params.include_key()).await
        }
        Err(e) => Err(e),
    };
    reply(result)
}

async fn import_handler(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<Vec<ImportItem>>, JsonRejection>,
) -> Reply<ImportSummary> {
    let items = match body(payload) {
        Ok(items) => items,
        Err(e) => return reply(Err(e)),
    };
    Json(ApiResponse::ok(state.channels.import(items).await))
}

async fn get_handler(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Reply<ChannelRecord> {
    let result = match parse_id(&id) {
        Ok(id) => state.channels.get(id).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn add_handler(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<ChannelRecord>, JsonRejection>,
) -> Reply<usize> {
    let result = match body(payload) {
        Ok(submission) => state.channels.add(submission).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn update_handler(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<ChannelRecord>, JsonRejection>,
) -> Reply<ChannelRecord> {
    let result = match body(payload) {
        Ok(record) => state.channels.update(record).await,
        Err(e) => Err(e),
    };
    reply(result)
}

async fn delete_disabled_handler(State(state): State<GatewayState>) -> Reply<u64> {
    reply(state.channels.delete_disabled().await)
}

async fn delete_handler(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Reply<()> {
    let result = match parse_id(&id) {
        Ok(id) => state.channels.delete(id).await,
        Err(e) => Err(e),
    };
    Json(match result {
        Ok(()) => ApiResponse::empty(),
        Err(e) => {
            warn!(error = %e, "Channel delete failed");
            ApiResponse::failure(e.to_string())
        }
    })
}
