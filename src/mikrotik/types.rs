// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Type definitions for RouterOS requests and results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One reply record: attribute name to raw attribute value
pub type Record = HashMap<String, String>;

/// Connection parameters for one device
///
/// When `port` is `None` the executor walks the configured fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredentials {
    pub ip: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl DeviceCredentials {
    #[must_use]
    pub fn new(ip: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            username: username.into(),
            password: password.into(),
            port: None,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Reachability of a device as seen by the last status fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceStatus {
    Online,
    Offline,
}

/// Status snapshot of one router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusSnapshot {
    pub status: DeviceStatus,
    pub cpu_usage: u64,
    pub memory_usage: u64,
    pub uptime: String,
    pub active_pppoe: u64,
}

impl ServerStatusSnapshot {
    /// Snapshot reported for a device whose status could not be fetched
    #[must_use]
    pub fn offline() -> Self {
        Self {
            status: DeviceStatus::Offline,
            cpu_usage: 0,
            memory_usage: 0,
            uptime: "N/A".to_string(),
            active_pppoe: 0,
        }
    }
}

/// Link state of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceStatus {
    Running,
    Down,
}

/// Interface entry joined with one live traffic sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStat {
    pub id: String,
    pub name: String,
    pub status: InterfaceStatus,
    pub rx_rate: String,
    pub tx_rate: String,
}

/// Interface as listed by `/interface/print`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub id: String,
    pub name: String,
    pub running: bool,
}

/// One `monitor-traffic` tick for a single interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrafficSample {
    pub rx_bits_per_second: u64,
    pub tx_bits_per_second: u64,
}

/// Point of a traffic series, rates in bits per second
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficPoint {
    /// Unix timestamp (seconds) at which the tick was received
    pub timestamp: u64,
    /// Chart label, `HH:MM:SS` UTC
    pub time: String,
    pub upload: u64,
    pub download: u64,
}

/// Point of a CPU/memory series, both in whole percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePoint {
    pub timestamp: u64,
    pub time: String,
    pub cpu: u64,
    pub memory: u64,
}

/// Active PPP session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeUser {
    pub id: String,
    pub name: String,
    pub service: String,
    pub ip_address: String,
    pub uptime: String,
    pub upload: String,
    pub download: String,
}

/// PPP secret to create on a router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPppoeUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_service() -> String {
    "pppoe".to_string()
}

fn default_profile() -> String {
    "default".to_string()
}

/// System resource values used by the status aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemResource {
    pub uptime: String,
    pub cpu_load: u64,
    pub free_memory: u64,
    pub total_memory: u64,
}

impl SystemResource {
    /// Used memory in whole percent; zero when the device reports no total
    #[must_use]
    pub fn memory_usage(&self) -> u64 {
        if self.total_memory == 0 {
            return 0;
        }
        let used = self.total_memory.saturating_sub(self.free_memory);
        ((used as f64 / self.total_memory as f64) * 100.0).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(total: u64, free: u64) -> SystemResource {
        SystemResource {
            uptime: "1d".to_string(),
            cpu_load: 5,
            free_memory: free,
            total_memory: total,
        }
    }

    #[test]
    fn test_memory_usage_quarter_free() {
        assert_eq!(resource(1_000_000, 250_000).memory_usage(), 75);
    }

    #[test]
    fn test_memory_usage_zero_total() {
        assert_eq!(resource(0, 0).memory_usage(), 0);
        assert_eq!(resource(0, 500).memory_usage(), 0);
    }

    #[test]
    fn test_memory_usage_rounds() {
        // 2/3 used
        assert_eq!(resource(3, 1).memory_usage(), 67);
    }

    #[test]
    fn test_memory_usage_free_above_total() {
        assert_eq!(resource(100, 150).memory_usage(), 0);
    }

    #[test]
    fn test_credentials_json_without_port() {
        let creds: DeviceCredentials =
            serde_json::from_str(r#"{"ip":"10.0.0.1","username":"admin","password":"x"}"#).unwrap();
        assert_eq!(creds.port, None);
        assert_eq!(creds, DeviceCredentials::new("10.0.0.1", "admin", "x"));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let json = serde_json::to_value(ServerStatusSnapshot::offline()).unwrap();
        assert_eq!(json["status"], "Offline");
        assert_eq!(json["cpuUsage"], 0);
        assert_eq!(json["activePppoe"], 0);
        assert_eq!(json["uptime"], "N/A");
    }

    #[test]
    fn test_new_pppoe_user_defaults() {
        let user: NewPppoeUser =
            serde_json::from_str(r#"{"username":"bob","password":"pw"}"#).unwrap();
        assert_eq!(user.service, "pppoe");
        assert_eq!(user.profile, "default");
    }
}
