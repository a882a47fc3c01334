// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS client error taxonomy

use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`RouterOsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, refused or reset
    Connect,
    /// Credentials rejected by the device
    Auth,
    /// Device answered with `!trap` to a well-formed command
    Device,
    /// A bounded wait ran out
    Timeout,
    /// Operation attempted on a closed session
    ClosedSession,
    /// Malformed or unexpected reply
    Protocol,
}

/// Errors produced by the RouterOS session, executor and client
#[derive(Debug, Error)]
pub enum RouterOsError {
    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("login rejected: {0}")]
    Auth(String),

    #[error("device rejected command: {message}")]
    Device { message: String },

    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("session is closed")]
    ClosedSession,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command failed after the session was opened
    #[error("{path} on {host}:{port} failed: {source}")]
    Command {
        host: String,
        port: u16,
        path: String,
        #[source]
        source: Box<RouterOsError>,
    },

    #[error("connection to {host} failed (tried ports {tried_ports:?}): {last_error}")]
    ConnectionFailed {
        host: String,
        tried_ports: Vec<u16>,
        last_error: Box<RouterOsError>,
    },
}

impl RouterOsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } | Self::Io(_) => ErrorKind::Connect,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Device { .. } => ErrorKind::Device,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ClosedSession => ErrorKind::ClosedSession,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::ConnectionFailed { last_error, .. } => last_error.kind(),
            Self::Command { source, .. } => source.kind(),
        }
    }

    /// The unmodified `!trap` message, if the device rejected a command
    #[must_use]
    pub fn device_message(&self) -> Option<&str> {
        match self {
            Self::Device { message } => Some(message),
            Self::Command { source, .. } => source.device_message(),
            _ => None,
        }
    }

    /// Whether the executor may move on to the next candidate port
    pub(crate) fn is_open_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Connect | ErrorKind::Auth | ErrorKind::Timeout | ErrorKind::Protocol
        )
    }
}

/// Convenient alias for RouterOS operations
pub type RouterOsResult<T> = std::result::Result<T, RouterOsError>;
