// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the MikroTik dashboard application

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::mikrotik::{ErrorKind, RouterOsError};

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// RouterOS API error
    #[error("RouterOS error: {0}")]
    RouterOs(#[from] RouterOsError),

    /// Device store error
    #[error("Store error: {0}")]
    Store(String),

    /// Rejected user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown device id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Store(error.to_string())
    }
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RouterOs(e) => match e.kind() {
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;
