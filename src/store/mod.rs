// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Device store
//!
//! The dashboard persists only connection records; live status is never stored.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::mikrotik::DeviceCredentials;

/// Stored MikroTik server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
}

impl DeviceRecord {
    #[must_use]
    pub fn credentials(&self) -> DeviceCredentials {
        DeviceCredentials {
            ip: self.ip.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            port: self.port,
        }
    }
}

/// Persistence boundary for device records
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>>;
    async fn save_devices(&self, devices: &[DeviceRecord]) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    devices: Vec<DeviceRecord>,
}

/// Devices kept in a pretty-printed JSON file (`{"devices": [...]}`)
pub struct JsonFileStore {
    path: PathBuf,
    // serializes file access within this process
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_exists(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        let empty = serde_json::to_string_pretty(&Database::default())?;
        tokio::fs::write(&self.path, empty).await?;
        tracing::info!("Created device store at {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DeviceRepository for JsonFileStore {
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>> {
        let _guard = self.lock.lock().await;
        self.ensure_exists().await?;
        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let db: Database = serde_json::from_str(&content).map_err(|e| {
            AppError::Store(format!("cannot parse {}: {e}", self.path.display()))
        })?;
        Ok(db.devices)
    }

    async fn save_devices(&self, devices: &[DeviceRecord]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let db = Database {
            devices: devices.to_vec(),
        };
        let content = serde_json::to_string_pretty(&db)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!("Saved {} devices to {}", devices.len(), self.path.display());
        Ok(())
    }
}

/// Devices kept in memory only
#[derive(Default)]
pub struct MemoryStore {
    devices: Mutex<Vec<DeviceRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_devices(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices: Mutex::new(devices),
        }
    }
}

#[async_trait]
impl DeviceRepository for MemoryStore {
    async fn load_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.devices.lock().await.clone())
    }

    async fn save_devices(&self, devices: &[DeviceRecord]) -> Result<()> {
        *self.devices.lock().await = devices.to_vec();
        Ok(())
    }
}
