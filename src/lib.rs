// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # MikroTik Dashboard
//!
//! Web dashboard backend for managing MikroTik RouterOS devices.
//!
//! Talks to routers over the RouterOS binary API and serves server status,
//! PPPoE users and interface traffic as JSON.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `config`: configuration management
//! - `dashboard`: device CRUD joined with live router data
//! - `error`: error types
//! - `mikrotik`: RouterOS API client
//! - `store`: device persistence
//! - `prelude`: commonly used types and traits

mod api;
mod config;
mod dashboard;
mod error;
mod mikrotik;
pub mod prelude;
mod store;

/// Application configuration
pub use config::{Config, RouterOsSettings};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Device CRUD and live queries
pub use dashboard::{Dashboard, NewDevice, ServerView};

/// Device persistence
pub use store::{DeviceRecord, DeviceRepository, JsonFileStore, MemoryStore};

/// RouterOS client, sessions and result types
pub use mikrotik::{
    CommandExecutor, Connector, DeviceCredentials, DeviceStatus, ErrorKind, InterfaceStat,
    InterfaceStatus, ListenOptions, MikroTikClient, NewPppoeUser, PppoeUser, Record,
    ResourcePoint, RouterOsError, RouterOsResult, RouterOsSession, ServerStatusSnapshot,
    Session, SessionState, TcpConnector, TrafficPoint, format_rate,
};

/// RouterOS wire protocol encoding (public for tests)
pub use mikrotik::{encode_length, encode_sentence};
