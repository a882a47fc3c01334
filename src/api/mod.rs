// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! HTTP API module for the MikroTik dashboard
//!
//! # Endpoints
//! - `GET /health` - health check
//! - `GET|POST /api/servers` - list or add servers
//! - `GET|PUT|DELETE /api/servers/{id}` - one server
//! - `GET|POST /api/servers/{id}/pppoe` - active PPPoE users, add a secret
//! - `GET /api/servers/{id}/profiles` - PPP profile names
//! - `GET /api/servers/{id}/interfaces` - interfaces with live rates
//! - `GET /api/servers/{id}/traffic?interface=&samples=` - traffic series
//! - `GET /api/servers/{id}/resources?samples=` - CPU and memory series

pub mod handlers;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::dashboard::Dashboard;

/// Application state shared with endpoints
pub struct AppState {
    pub dashboard: Dashboard,
}

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/servers",
            get(handlers::list_servers).post(handlers::create_server),
        )
        .route(
            "/api/servers/{id}",
            get(handlers::get_server)
                .put(handlers::update_server)
                .delete(handlers::delete_server),
        )
        .route(
            "/api/servers/{id}/pppoe",
            get(handlers::list_pppoe_users).post(handlers::add_pppoe_user),
        )
        .route("/api/servers/{id}/profiles", get(handlers::list_profiles))
        .route("/api/servers/{id}/interfaces", get(handlers::list_interfaces))
        .route("/api/servers/{id}/traffic", get(handlers::traffic))
        .route("/api/servers/{id}/resources", get(handlers::resources))
        .with_state(state)
}
