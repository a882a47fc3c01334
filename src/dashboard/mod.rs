// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Data-access layer for the dashboard
//!
//! Joins stored device records with live data fetched from the routers.
//! This is the outermost boundary: an unreachable router is reported as
//! `Offline` here, and read-only lists degrade to empty.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::mikrotik::{
    InterfaceStat, MikroTikClient, NewPppoeUser, PppoeUser, ResourcePoint, ServerStatusSnapshot,
    TrafficPoint,
};
use crate::store::{DeviceRecord, DeviceRepository};

/// Maximum ticks a single traffic or resource request may ask for
pub const MAX_SERIES_SAMPLES: usize = 60;

/// Server form payload
///
/// `ip` may carry a `:port` suffix, which is split off during validation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Validated endpoint of a [`NewDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: String,
    pub port: Option<u16>,
}

fn split_endpoint(raw: &str) -> Result<Endpoint> {
    let raw = raw.trim();
    if raw.parse::<IpAddr>().is_ok() {
        return Ok(Endpoint {
            ip: raw.to_string(),
            port: None,
        });
    }

    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| AppError::Validation(format!("invalid IP address '{raw}'")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.parse::<IpAddr>().is_err() {
        return Err(AppError::Validation(format!("invalid IP address '{host}'")));
    }
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| AppError::Validation(format!("invalid port '{port}'")))?;
    Ok(Endpoint {
        ip: host.to_string(),
        port: Some(port),
    })
}

impl NewDevice {
    /// Validates the form; `require_password` is false for updates, where an
    /// empty password keeps the stored one
    pub fn validate(&self, require_password: bool) -> Result<Endpoint> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        if require_password && self.password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }

        let mut endpoint = split_endpoint(&self.ip)?;
        match (endpoint.port, self.port) {
            (_, Some(0)) => {
                return Err(AppError::Validation("invalid port '0'".to_string()));
            }
            (Some(embedded), Some(explicit)) if embedded != explicit => {
                return Err(AppError::Validation(format!(
                    "conflicting ports {embedded} and {explicit}"
                )));
            }
            (None, explicit) => endpoint.port = explicit,
            _ => {}
        }
        Ok(endpoint)
    }
}

/// Server as shown by the dashboard: stored fields plus live status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerView {
    pub id: String,
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(flatten)]
    pub live: ServerStatusSnapshot,
}

impl ServerView {
    fn new(record: &DeviceRecord, live: ServerStatusSnapshot) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            ip: record.ip.clone(),
            port: record.port,
            device_type: "MikroTik".to_string(),
            live,
        }
    }
}

/// Device CRUD and live queries
pub struct Dashboard {
    store: Arc<dyn DeviceRepository>,
    client: MikroTikClient,
    // serializes load-modify-save cycles on the store
    write_lock: Mutex<()>,
}

impl Dashboard {
    #[must_use]
    pub fn new(store: Arc<dyn DeviceRepository>, client: MikroTikClient) -> Self {
        Self {
            store,
            client,
            write_lock: Mutex::new(()),
        }
    }

    async fn find(&self, id: &str) -> Result<DeviceRecord> {
        self.store
            .load_devices()
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("server '{id}'")))
    }

    async fn live_status(&self, record: &DeviceRecord) -> ServerStatusSnapshot {
        match self.client.fetch_status(&record.credentials()).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    "Failed to fetch status for {} ({}): {}",
                    record.name,
                    record.ip,
                    e
                );
                ServerStatusSnapshot::offline()
            }
        }
    }

    /// Number of stored servers; touches only the store
    pub async fn server_count(&self) -> Result<usize> {
        Ok(self.store.load_devices().await?.len())
    }

    /// All servers with live status, fetched concurrently
    pub async fn list_servers(&self) -> Result<Vec<ServerView>> {
        let records = self.store.load_devices().await?;
        tracing::debug!("Fetching live status for {} servers", records.len());
        let statuses = join_all(records.iter().map(|r| self.live_status(r))).await;
        Ok(records
            .iter()
            .zip(statuses)
            .map(|(record, live)| ServerView::new(record, live))
            .collect())
    }

    pub async fn get_server(&self, id: &str) -> Result<ServerView> {
        let record = self.find(id).await?;
        let live = self.live_status(&record).await;
        Ok(ServerView::new(&record, live))
    }

    /// Adds a server after checking that it accepts the credentials
    pub async fn add_server(&self, device: NewDevice) -> Result<ServerView> {
        let endpoint = device.validate(true)?;
        let mut record = DeviceRecord {
            id: String::new(),
            name: device.name.trim().to_string(),
            ip: endpoint.ip,
            port: endpoint.port,
            username: device.username.trim().to_string(),
            password: device.password,
        };

        self.client.test_connection(&record.credentials()).await?;

        let _guard = self.write_lock.lock().await;
        let mut devices = self.store.load_devices().await?;
        record.id = next_id(&devices);
        devices.push(record.clone());
        self.store.save_devices(&devices).await?;
        tracing::info!("Server '{}' added as {}", record.name, record.id);

        Ok(ServerView::new(&record, ServerStatusSnapshot::offline()))
    }

    pub async fn update_server(&self, id: &str, device: NewDevice) -> Result<ServerView> {
        let endpoint = device.validate(false)?;

        let _guard = self.write_lock.lock().await;
        let mut devices = self.store.load_devices().await?;
        let record = devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("server '{id}'")))?;
        record.name = device.name.trim().to_string();
        record.ip = endpoint.ip;
        record.port = endpoint.port;
        record.username = device.username.trim().to_string();
        if !device.password.is_empty() {
            record.password = device.password;
        }
        let updated = record.clone();
        self.store.save_devices(&devices).await?;
        tracing::info!("Server {} updated", id);

        Ok(ServerView::new(&updated, ServerStatusSnapshot::offline()))
    }

    pub async fn delete_server(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut devices = self.store.load_devices().await?;
        let before = devices.len();
        devices.retain(|d| d.id != id);
        if devices.len() == before {
            return Err(AppError::NotFound(format!("server '{id}'")));
        }
        self.store.save_devices(&devices).await?;
        tracing::info!("Server {} deleted", id);
        Ok(())
    }

    pub async fn pppoe_users(&self, id: &str) -> Result<Vec<PppoeUser>> {
        let record = self.find(id).await?;
        Ok(self
            .client
            .fetch_pppoe_users(&record.credentials())
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch PPPoE users for server {}: {}", id, e);
                Vec::new()
            }))
    }

    pub async fn interface_stats(&self, id: &str) -> Result<Vec<InterfaceStat>> {
        let record = self.find(id).await?;
        Ok(self
            .client
            .fetch_interface_stats(&record.credentials())
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch interface stats for server {}: {}", id, e);
                Vec::new()
            }))
    }

    pub async fn traffic_data(
        &self,
        id: &str,
        interface: &str,
        samples: usize,
    ) -> Result<Vec<TrafficPoint>> {
        if interface.trim().is_empty() {
            return Err(AppError::Validation("interface is required".to_string()));
        }
        let samples = samples.clamp(1, MAX_SERIES_SAMPLES);
        let record = self.find(id).await?;
        Ok(self
            .client
            .fetch_traffic_data(&record.credentials(), interface, samples)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch traffic data for server {}: {}", id, e);
                Vec::new()
            }))
    }

    pub async fn resource_data(&self, id: &str, samples: usize) -> Result<Vec<ResourcePoint>> {
        let samples = samples.clamp(1, MAX_SERIES_SAMPLES);
        let record = self.find(id).await?;
        Ok(self
            .client
            .fetch_resource_data(&record.credentials(), samples)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch resource data for server {}: {}", id, e);
                Vec::new()
            }))
    }

    pub async fn pppoe_profiles(&self, id: &str) -> Result<Vec<String>> {
        let record = self.find(id).await?;
        Ok(self
            .client
            .fetch_pppoe_profiles(&record.credentials())
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to fetch PPPoE profiles for server {}: {}", id, e);
                Vec::new()
            }))
    }

    pub async fn add_pppoe_user(&self, id: &str, user: NewPppoeUser) -> Result<()> {
        if user.username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        if user.password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }
        let record = self.find(id).await?;
        self.client
            .add_pppoe_user(&record.credentials(), &user)
            .await?;
        Ok(())
    }
}

fn next_id(existing: &[DeviceRecord]) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let mut id = format!("server-{millis}");
    let mut suffix = 1;
    while existing.iter().any(|d| d.id == id) {
        id = format!("server-{millis}-{suffix}");
        suffix += 1;
    }
    id
}
