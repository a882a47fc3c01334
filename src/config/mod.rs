// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the MikroTik dashboard
//!
//! Loads and parses configuration from environment variables.

use std::time::Duration;


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:9002";
    pub const DEVICES_DB: &str = "db.json";
    /// RouterOS default API port, then a commonly used alternate
    pub const ROUTEROS_PORTS: [u16; 2] = [8728, 7070];
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const COMMAND_TIMEOUT_SECS: u64 = 30;
    pub const SAMPLE_TIMEOUT_SECS: u64 = 3;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const DEVICES_DB: &str = "DEVICES_DB";
    pub const ROUTEROS_PORTS: &str = "ROUTEROS_PORTS";
    pub const CONNECT_TIMEOUT_SECS: &str = "ROUTEROS_CONNECT_TIMEOUT_SECS";
    pub const COMMAND_TIMEOUT_SECS: &str = "ROUTEROS_COMMAND_TIMEOUT_SECS";
    pub const SAMPLE_TIMEOUT_SECS: &str = "ROUTEROS_SAMPLE_TIMEOUT_SECS";
}

/// RouterOS client behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOsSettings {
    /// Ports tried in order when a device has no explicit port
    pub fallback_ports: Vec<u16>,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub sample_timeout_secs: u64,
}

impl Default for RouterOsSettings {
    fn default() -> Self {
        Self {
            fallback_ports: defaults::ROUTEROS_PORTS.to_vec(),
            connect_timeout_secs: defaults::CONNECT_TIMEOUT_SECS,
            command_timeout_secs: defaults::COMMAND_TIMEOUT_SECS,
            sample_timeout_secs: defaults::SAMPLE_TIMEOUT_SECS,
        }
    }
}

impl RouterOsSettings {
    /// Validates client settings
    pub fn validate(&self) -> Result<(), String> {
        if self.fallback_ports.is_empty() {
            return Err("Fallback port list cannot be empty".to_string());
        }
        if self.fallback_ports.contains(&0) {
            return Err("Port 0 is not a valid RouterOS API port".to_string());
        }
        if self.connect_timeout_secs == 0
            || self.command_timeout_secs == 0
            || self.sample_timeout_secs == 0
        {
            return Err("Timeouts must be at least one second".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_secs(self.sample_timeout_secs)
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub devices_db: String,
    pub routeros: RouterOsSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            devices_db: defaults::DEVICES_DB.to_string(),
            routeros: RouterOsSettings::default(),
        }
    }
}

/// Parses a comma separated port list; `None` if any entry is invalid
pub(crate) fn parse_ports(raw: &str) -> Option<Vec<u16>> {
    let ports: Option<Vec<u16>> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u16>().ok().filter(|port| *port != 0))
        .collect();
    ports.filter(|p| !p.is_empty())
}

fn secs_from_env(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => {
                tracing::warn!("Invalid {}='{}', using {}s", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let server_addr = std::env::var(env_vars::SERVER_ADDR)
            .unwrap_or_else(|_| defaults::SERVER_ADDR.to_string());

        let devices_db = std::env::var(env_vars::DEVICES_DB)
            .unwrap_or_else(|_| defaults::DEVICES_DB.to_string());

        let fallback_ports = match std::env::var(env_vars::ROUTEROS_PORTS) {
            Ok(raw) => parse_ports(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "Failed to parse {}='{}'. Using default ports.",
                    env_vars::ROUTEROS_PORTS,
                    raw
                );
                defaults::ROUTEROS_PORTS.to_vec()
            }),
            Err(_) => defaults::ROUTEROS_PORTS.to_vec(),
        };

        let routeros = RouterOsSettings {
            fallback_ports,
            connect_timeout_secs: secs_from_env(
                env_vars::CONNECT_TIMEOUT_SECS,
                defaults::CONNECT_TIMEOUT_SECS,
            ),
            command_timeout_secs: secs_from_env(
                env_vars::COMMAND_TIMEOUT_SECS,
                defaults::COMMAND_TIMEOUT_SECS,
            ),
            sample_timeout_secs: secs_from_env(
                env_vars::SAMPLE_TIMEOUT_SECS,
                defaults::SAMPLE_TIMEOUT_SECS,
            ),
        };

        let routeros = match routeros.validate() {
            Ok(()) => routeros,
            Err(e) => {
                tracing::error!("Invalid RouterOS settings: {}", e);
                tracing::warn!("Falling back to default RouterOS settings");
                RouterOsSettings::default()
            }
        };

        Config {
            server_addr,
            devices_db,
            routeros,
        }
    }
}
