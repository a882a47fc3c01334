// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::AppState;
use crate::error::Result;
use crate::mikrotik::{NewPppoeUser, PppoeUser};

/// GET /api/servers/{id}/pppoe
pub async fn list_pppoe_users(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PppoeUser>>> {
    Ok(Json(state.dashboard.pppoe_users(&id).await?))
}

/// POST /api/servers/{id}/pppoe
///
/// A secret the router refuses (duplicate name, unknown profile) comes back
/// as 502 carrying the router's own message.
pub async fn add_pppoe_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(user): Json<NewPppoeUser>,
) -> Result<(StatusCode, Json<Value>)> {
    let username = user.username.clone();
    state.dashboard.add_pppoe_user(&id, user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "username": username })),
    ))
}

/// GET /api/servers/{id}/profiles
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>> {
    Ok(Json(state.dashboard.pppoe_profiles(&id).await?))
}
