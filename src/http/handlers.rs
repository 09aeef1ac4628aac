//! Axum HTTP handlers for the web server
//!
//! Provides the JSON-RPC endpoint and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::dispatch::handle_payload;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub rpc_endpoint: &'static str,
    pub methods: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rpc_endpoint: "/rpc",
        methods: state
            .registry
            .method_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Every JSON-RPC outcome, errors included, travels with 200; 204 means
/// there was nothing to answer.
pub async fn rpc_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    match handle_payload(&state.registry, &body).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
