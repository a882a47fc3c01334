// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::dashboard::{NewDevice, ServerView};
use crate::error::Result;
use crate::mikrotik::{InterfaceStat, ResourcePoint, TrafficPoint};

const DEFAULT_SERIES_SAMPLES: usize = 10;

/// GET /api/servers
pub async fn list_servers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ServerView>>> {
    Ok(Json(state.dashboard.list_servers().await?))
}

/// POST /api/servers
///
/// The router must accept the credentials before the server is stored.
pub async fn create_server(
    State(state): State<Arc<AppState>>,
    Json(device): Json<NewDevice>,
) -> Result<(StatusCode, Json<ServerView>)> {
    let server = state.dashboard.add_server(device).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

/// GET /api/servers/{id}
pub async fn get_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServerView>> {
    Ok(Json(state.dashboard.get_server(&id).await?))
}

/// PUT /api/servers/{id}
pub async fn update_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(device): Json<NewDevice>,
) -> Result<Json<ServerView>> {
    Ok(Json(state.dashboard.update_server(&id, device).await?))
}

/// DELETE /api/servers/{id}
pub async fn delete_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.dashboard.delete_server(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/servers/{id}/interfaces
pub async fn list_interfaces(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<InterfaceStat>>> {
    Ok(Json(state.dashboard.interface_stats(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct TrafficQuery {
    pub interface: String,
    pub samples: Option<usize>,
}

/// GET /api/servers/{id}/traffic
pub async fn traffic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TrafficQuery>,
) -> Result<Json<Vec<TrafficPoint>>> {
    let samples = query.samples.unwrap_or(DEFAULT_SERIES_SAMPLES);
    Ok(Json(
        state
            .dashboard
            .traffic_data(&id, &query.interface, samples)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub samples: Option<usize>,
}

/// GET /api/servers/{id}/resources
pub async fn resources(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ResourceQuery>,
) -> Result<Json<Vec<ResourcePoint>>> {
    let samples = query.samples.unwrap_or(DEFAULT_SERIES_SAMPLES);
    Ok(Json(state.dashboard.resource_data(&id, samples).await?))
}
