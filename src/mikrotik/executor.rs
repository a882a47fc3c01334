// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Single-shot command execution with port fallback
//!
//! Every call gets its own session; nothing is pooled or shared between calls.

use std::sync::Arc;
use std::time::Duration;

use super::connection::{Connector, Session};
use super::error::{RouterOsError, RouterOsResult};
use super::types::{DeviceCredentials, Record};
use crate::config::RouterOsSettings;

/// Opens sessions against a device and runs commands on them
#[derive(Clone)]
pub struct CommandExecutor {
    connector: Arc<dyn Connector>,
    fallback_ports: Vec<u16>,
    connect_timeout: Duration,
}

impl CommandExecutor {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, settings: &RouterOsSettings) -> Self {
        Self {
            connector,
            fallback_ports: settings.fallback_ports.clone(),
            connect_timeout: settings.connect_timeout(),
        }
    }

    /// Ports to try for `credentials`, in order
    #[must_use]
    pub fn candidate_ports(&self, credentials: &DeviceCredentials) -> Vec<u16> {
        match credentials.port {
            Some(port) => vec![port],
            None => self.fallback_ports.clone(),
        }
    }

    /// Opens an authenticated session on the first candidate port that accepts.
    ///
    /// The caller owns the returned session and must close it.
    ///
    /// # Errors
    ///
    /// Returns [`RouterOsError::ConnectionFailed`] once every candidate port
    /// has failed, carrying the ports tried and the last failure.
    pub async fn open(
        &self,
        credentials: &DeviceCredentials,
    ) -> RouterOsResult<(Box<dyn Session>, u16)> {
        let mut tried_ports = Vec::new();
        let mut last_error = None;

        for port in self.candidate_ports(credentials) {
            tried_ports.push(port);
            match self
                .connector
                .open(
                    &credentials.ip,
                    port,
                    &credentials.username,
                    &credentials.password,
                    self.connect_timeout,
                )
                .await
            {
                Ok(session) => {
                    tracing::debug!("Connected to {}:{}", credentials.ip, port);
                    return Ok((session, port));
                }
                Err(e) if e.is_open_failure() => {
                    tracing::warn!("Connection to {}:{} failed: {}", credentials.ip, port, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::error!("Unexpected failure opening {}:{}: {}", credentials.ip, port, e);
                    return Err(e);
                }
            }
        }

        Err(RouterOsError::ConnectionFailed {
            host: credentials.ip.clone(),
            tried_ports,
            last_error: Box::new(last_error.unwrap_or_else(|| {
                RouterOsError::Protocol("no candidate ports configured".to_string())
            })),
        })
    }

    /// Runs one command on a fresh session and closes it on every path
    ///
    /// # Errors
    ///
    /// Connection failures as in [`Self::open`]; command failures (device
    /// trap, timeout, I/O) come back as [`RouterOsError::Command`] naming the
    /// host and port, after the session is closed.
    pub async fn run(
        &self,
        credentials: &DeviceCredentials,
        path: &str,
        params: &[String],
    ) -> RouterOsResult<Vec<Record>> {
        let (mut session, port) = self.open(credentials).await?;
        let result = session.execute(path, params).await;
        session.close().await;

        result.map_err(|e| {
            tracing::warn!(
                "Command {} on {}:{} failed: {}",
                path,
                credentials.ip,
                port,
                e
            );
            command_error(credentials, port, path, e)
        })
    }
}

/// Attaches host, port and command path to a failure on an open session
pub(crate) fn command_error(
    credentials: &DeviceCredentials,
    port: u16,
    path: &str,
    source: RouterOsError,
) -> RouterOsError {
    RouterOsError::Command {
        host: credentials.ip.clone(),
        port,
        path: path.to_string(),
        source: Box::new(source),
    }
}
