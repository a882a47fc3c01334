// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Device status snapshot built from system resource and PPP counters

use std::time::Duration;

use super::connection::ListenOptions;
use super::connection::parse::{parse_count, parse_system};
use super::error::RouterOsResult;
use super::executor::{CommandExecutor, command_error};
use super::monitor::tick_times;
use super::types::{
    DeviceCredentials, DeviceStatus, ResourcePoint, ServerStatusSnapshot, SystemResource,
};

pub(crate) const RESOURCE_PRINT: &str = "/system/resource/print";
pub(crate) const PPP_ACTIVE_PRINT: &str = "/ppp/active/print";

fn pppoe_count_params() -> Vec<String> {
    vec!["=count-only=".to_string(), "?service=pppoe".to_string()]
}

/// Builds an online snapshot from parsed device values
#[must_use]
pub(crate) fn snapshot(system: &SystemResource, active_pppoe: u64) -> ServerStatusSnapshot {
    ServerStatusSnapshot {
        status: DeviceStatus::Online,
        cpu_usage: system.cpu_load,
        memory_usage: system.memory_usage(),
        uptime: system.uptime.clone(),
        active_pppoe,
    }
}

/// Fetches resource usage and the active PPPoE count concurrently.
///
/// Either command failing fails the whole snapshot. Both commands always run
/// to completion so that each closes its own session.
pub(crate) async fn fetch_status(
    executor: &CommandExecutor,
    credentials: &DeviceCredentials,
) -> RouterOsResult<ServerStatusSnapshot> {
    let count_params = pppoe_count_params();
    let (resource, pppoe) = tokio::join!(
        executor.run(credentials, RESOURCE_PRINT, &[]),
        executor.run(credentials, PPP_ACTIVE_PRINT, &count_params),
    );
    let resource = resource?;
    let pppoe = pppoe?;

    let system = parse_system(&resource);
    let active_pppoe = parse_count(&pppoe)?;
    tracing::debug!(
        "Status for {}: cpu {}%, {} active PPPoE",
        credentials.ip,
        system.cpu_load,
        active_pppoe
    );
    Ok(snapshot(&system, active_pppoe))
}

/// Streams `samples` resource prints (one per second) as a CPU/memory series
pub(crate) async fn fetch_resource_data(
    executor: &CommandExecutor,
    credentials: &DeviceCredentials,
    samples: usize,
    timeout: Duration,
) -> RouterOsResult<Vec<ResourcePoint>> {
    let (mut session, port) = executor.open(credentials).await?;
    let options = ListenOptions {
        max_records: samples,
        timeout,
        one_shot: false,
    };
    let params = ["=interval=1".to_string()];
    let result = session.listen(RESOURCE_PRINT, &params, options).await;
    session.close().await;

    let ticks: Vec<SystemResource> = result
        .map_err(|e| command_error(credentials, port, RESOURCE_PRINT, e))?
        .into_iter()
        .filter(|r| r.contains_key("cpu-load"))
        .map(|r| parse_system(std::slice::from_ref(&r)))
        .collect();
    Ok(ticks
        .iter()
        .zip(tick_times(ticks.len()))
        .map(|(system, (timestamp, time))| ResourcePoint {
            timestamp,
            time,
            cpu: system.cpu_load,
            memory: system.memory_usage(),
        })
        .collect())
}
