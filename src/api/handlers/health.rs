// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;

/// Health check endpoint response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of stored servers, absent if the store could not be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<usize>,
}

/// GET /health
///
/// Reports "ok" when the device store is readable, "degraded" (503) otherwise.
/// Routers are not contacted.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dashboard.server_count().await {
        Ok(count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                servers: Some(count),
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check cannot read device store: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    servers: None,
                }),
            )
        }
    }
}
