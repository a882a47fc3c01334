// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! High-level MikroTik client

use std::sync::Arc;
use std::time::Duration;

use super::connection::parse::{parse_ppp_active, parse_profile_names};
use super::connection::{Connector, TcpConnector};
use super::error::RouterOsResult;
use super::executor::CommandExecutor;
use super::monitor;
use super::status;
use super::types::{
    DeviceCredentials, InterfaceStat, NewPppoeUser, PppoeUser, ResourcePoint, ServerStatusSnapshot,
    TrafficPoint,
};
use crate::config::RouterOsSettings;

/// `MikroTik` `RouterOS` API client
///
/// Every operation opens its own session(s) and closes them before
/// returning; the client itself holds no connection.
#[derive(Clone)]
pub struct MikroTikClient {
    executor: CommandExecutor,
    sample_timeout: Duration,
    stream_timeout: Duration,
}

impl MikroTikClient {
    /// Creates a client that talks to devices over TCP
    #[must_use]
    pub fn new(settings: &RouterOsSettings) -> Self {
        let connector = Arc::new(TcpConnector::new(settings.command_timeout()));
        Self::with_connector(connector, settings)
    }

    /// Creates a client over a custom session connector
    #[must_use]
    pub fn with_connector(connector: Arc<dyn Connector>, settings: &RouterOsSettings) -> Self {
        Self {
            executor: CommandExecutor::new(connector, settings),
            sample_timeout: settings.sample_timeout(),
            stream_timeout: settings.command_timeout(),
        }
    }

    #[must_use]
    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Checks that the device is reachable and accepts the credentials
    ///
    /// # Errors
    ///
    /// Returns the connection or command failure.
    pub async fn test_connection(&self, credentials: &DeviceCredentials) -> RouterOsResult<()> {
        tracing::info!("Testing connection to {}", credentials.ip);
        self.executor
            .run(credentials, "/system/identity/print", &[])
            .await?;
        Ok(())
    }

    /// Fetches CPU, memory, uptime and active PPPoE count
    ///
    /// # Errors
    ///
    /// Fails as a whole if either underlying command fails.
    pub async fn fetch_status(
        &self,
        credentials: &DeviceCredentials,
    ) -> RouterOsResult<ServerStatusSnapshot> {
        status::fetch_status(&self.executor, credentials).await
    }

    /// Lists active PPPoE sessions
    ///
    /// # Errors
    ///
    /// Returns the connection or command failure.
    pub async fn fetch_pppoe_users(
        &self,
        credentials: &DeviceCredentials,
    ) -> RouterOsResult<Vec<PppoeUser>> {
        let records = self
            .executor
            .run(
                credentials,
                status::PPP_ACTIVE_PRINT,
                &["?service=pppoe".to_string()],
            )
            .await?;
        Ok(parse_ppp_active(&records))
    }

    /// Lists interfaces with one live traffic sample each
    ///
    /// # Errors
    ///
    /// Fails only if the device cannot be reached or the interface list
    /// cannot be read; individual samples degrade to zero rates.
    pub async fn fetch_interface_stats(
        &self,
        credentials: &DeviceCredentials,
    ) -> RouterOsResult<Vec<InterfaceStat>> {
        monitor::fetch_interface_stats(&self.executor, credentials, self.sample_timeout).await
    }

    /// Streams up to `samples` traffic ticks for one interface
    ///
    /// # Errors
    ///
    /// Returns the connection or stream failure.
    pub async fn fetch_traffic_data(
        &self,
        credentials: &DeviceCredentials,
        interface: &str,
        samples: usize,
    ) -> RouterOsResult<Vec<TrafficPoint>> {
        monitor::fetch_traffic_data(
            &self.executor,
            credentials,
            interface,
            samples,
            self.stream_timeout,
        )
        .await
    }

    /// Streams up to `samples` CPU/memory ticks, one per second
    ///
    /// # Errors
    ///
    /// Returns the connection or stream failure.
    pub async fn fetch_resource_data(
        &self,
        credentials: &DeviceCredentials,
        samples: usize,
    ) -> RouterOsResult<Vec<ResourcePoint>> {
        status::fetch_resource_data(&self.executor, credentials, samples, self.stream_timeout)
            .await
    }

    /// Creates a PPP secret
    ///
    /// # Errors
    ///
    /// A rejected secret (e.g. duplicate name) has kind
    /// [`ErrorKind::Device`](super::ErrorKind::Device); `device_message()`
    /// returns the device's text unmodified.
    pub async fn add_pppoe_user(
        &self,
        credentials: &DeviceCredentials,
        user: &NewPppoeUser,
    ) -> RouterOsResult<()> {
        tracing::info!("Adding PPPoE user '{}' on {}", user.username, credentials.ip);
        let params = [
            format!("=name={}", user.username),
            format!("=password={}", user.password),
            format!("=service={}", user.service),
            format!("=profile={}", user.profile),
        ];
        self.executor
            .run(credentials, "/ppp/secret/add", &params)
            .await?;
        Ok(())
    }

    /// Lists PPP profile names in device order
    ///
    /// # Errors
    ///
    /// Returns the connection or command failure.
    pub async fn fetch_pppoe_profiles(
        &self,
        credentials: &DeviceCredentials,
    ) -> RouterOsResult<Vec<String>> {
        let records = self
            .executor
            .run(
                credentials,
                "/ppp/profile/print",
                &["=.proplist=name".to_string()],
            )
            .await?;
        Ok(parse_profile_names(&records))
    }
}
