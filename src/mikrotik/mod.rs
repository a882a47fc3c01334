//! `MikroTik` `RouterOS` API client module
//!
//! This module provides functionality to connect to `MikroTik` routers via the `RouterOS` API,
//! authenticate, run commands and sample live interface traffic.

mod client;
mod connection;
mod error;
mod executor;
mod monitor;
mod status;
#[cfg(test)]
pub(crate) mod testing;
mod types;

// Re-export public types and functions
pub use client::MikroTikClient;
pub use connection::{
    Connector, ListenOptions, RouterOsSession, Session, SessionState, TcpConnector,
    encode_length, encode_sentence,
};
pub use error::{ErrorKind, RouterOsError, RouterOsResult};
pub use executor::CommandExecutor;
pub use monitor::format_rate;
pub use types::{
    DeviceCredentials, DeviceStatus, InterfaceStat, InterfaceStatus,
    NewPppoeUser, PppoeUser, Record, ResourcePoint, ServerStatusSnapshot, TrafficPoint,
};
