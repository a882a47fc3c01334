// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! ```rust
//! use mikrotik_dashboard::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, RouterOsSettings};
pub use crate::error::{AppError, Result};

// Dashboard and storage
pub use crate::dashboard::{Dashboard, NewDevice, ServerView};
pub use crate::store::{DeviceRecord, DeviceRepository, JsonFileStore, MemoryStore};

// MikroTik client
pub use crate::mikrotik::{
    DeviceCredentials, DeviceStatus, ErrorKind, InterfaceStat, MikroTikClient, NewPppoeUser,
    PppoeUser, ResourcePoint, RouterOsError, ServerStatusSnapshot, TrafficPoint,
};
