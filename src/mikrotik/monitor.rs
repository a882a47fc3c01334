// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Interface enumeration and live traffic sampling
//!
//! Interfaces are sampled one at a time over a single session. A failed or
//! missing sample degrades to zero rates for that interface only.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::connection::parse::{parse_interfaces, parse_traffic_sample};
use super::connection::{ListenOptions, Session, SessionState};
use super::error::RouterOsResult;
use super::executor::{CommandExecutor, command_error};
use super::types::{
    DeviceCredentials, InterfaceInfo, InterfaceStat, InterfaceStatus, TrafficPoint, TrafficSample,
};

pub(crate) const INTERFACE_PRINT: &str = "/interface/print";
pub(crate) const MONITOR_TRAFFIC: &str = "/interface/monitor-traffic";

/// Formats a bit rate for display: `bps` below 1000, then `Kbps` and `Mbps`
/// with one decimal
#[must_use]
pub fn format_rate(bits_per_second: u64) -> String {
    if bits_per_second < 1_000 {
        format!("{bits_per_second} bps")
    } else if bits_per_second < 1_000_000 {
        format!("{:.1} Kbps", bits_per_second as f64 / 1_000.0)
    } else {
        format!("{:.1} Mbps", bits_per_second as f64 / 1_000_000.0)
    }
}

/// Formats seconds since the epoch as `HH:MM:SS` (UTC)
pub(crate) fn clock_time(unix_secs: u64) -> String {
    let day = unix_secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3_600, day % 3_600 / 60, day % 60)
}

/// Timestamps for `count` ticks received one second apart, the last one now
pub(crate) fn tick_times(count: usize) -> Vec<(u64, String)> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let first = now.saturating_sub((count as u64).saturating_sub(1));
    (0..count as u64)
        .map(|i| (first + i, clock_time(first + i)))
        .collect()
}

fn monitor_params(interface: &str, once: bool) -> Vec<String> {
    let mut params = vec![format!("=interface={interface}")];
    if once {
        params.push("=once=".to_string());
    }
    params
}

/// Joins the interface list with samples looked up by name, keeping list order
pub(crate) fn join_samples(
    interfaces: &[InterfaceInfo],
    samples: &HashMap<String, TrafficSample>,
) -> Vec<InterfaceStat> {
    interfaces
        .iter()
        .map(|iface| {
            let sample = samples.get(&iface.name).copied().unwrap_or_default();
            InterfaceStat {
                id: iface.id.clone(),
                name: iface.name.clone(),
                status: if iface.running {
                    InterfaceStatus::Running
                } else {
                    InterfaceStatus::Down
                },
                rx_rate: format_rate(sample.rx_bits_per_second),
                tx_rate: format_rate(sample.tx_bits_per_second),
            }
        })
        .collect()
}

/// Requests one sample for `interface`; returns the name the device reported
/// it under together with the rates
async fn sample_interface(
    session: &mut dyn Session,
    interface: &str,
    timeout: Duration,
) -> RouterOsResult<Option<(String, TrafficSample)>> {
    let options = ListenOptions {
        max_records: 1,
        timeout,
        one_shot: true,
    };
    let records = session
        .listen(MONITOR_TRAFFIC, &monitor_params(interface, true), options)
        .await?;
    Ok(records.iter().find_map(|record| {
        let sample = parse_traffic_sample(record)?;
        let name = record
            .get("name")
            .cloned()
            .unwrap_or_else(|| interface.to_string());
        Some((name, sample))
    }))
}

/// Lists interfaces and attaches one traffic sample to each.
///
/// Only the interface listing can fail the call.
pub(crate) async fn fetch_interface_stats(
    executor: &CommandExecutor,
    credentials: &DeviceCredentials,
    sample_timeout: Duration,
) -> RouterOsResult<Vec<InterfaceStat>> {
    let (mut first, port) = executor.open(credentials).await?;
    let proplist = vec!["=.proplist=.id,name,running".to_string()];
    let listing = first.execute(INTERFACE_PRINT, &proplist).await;
    let interfaces = match listing {
        Ok(records) => parse_interfaces(&records),
        Err(e) => {
            first.close().await;
            return Err(command_error(credentials, port, INTERFACE_PRINT, e));
        }
    };
    tracing::debug!(
        "Sampling traffic on {} interfaces of {}",
        interfaces.len(),
        credentials.ip
    );

    let mut session = Some(first);
    let mut samples: HashMap<String, TrafficSample> = HashMap::new();
    for iface in &interfaces {
        if session
            .as_ref()
            .is_some_and(|s| s.state() == SessionState::Closed)
        {
            if let Some(mut lost) = session.take() {
                lost.close().await;
            }
            tracing::debug!("Session to {} lost, reopening", credentials.ip);
            session = match executor.open(credentials).await {
                Ok((fresh, _port)) => Some(fresh),
                Err(e) => {
                    tracing::warn!("Cannot reopen session to {}: {}", credentials.ip, e);
                    None
                }
            };
        }
        let Some(active) = session.as_mut() else {
            break;
        };

        match sample_interface(&mut **active, &iface.name, sample_timeout).await {
            Ok(Some((name, sample))) => {
                samples.insert(name, sample);
            }
            Ok(None) => {
                tracing::debug!("No traffic sample for {} on {}", iface.name, credentials.ip);
            }
            Err(e) => {
                tracing::warn!(
                    "Traffic sample for {} on {} failed: {}",
                    iface.name,
                    credentials.ip,
                    e
                );
            }
        }
    }

    if let Some(mut active) = session {
        active.close().await;
    }
    Ok(join_samples(&interfaces, &samples))
}

/// Streams `samples` ticks of `monitor-traffic` for one interface
pub(crate) async fn fetch_traffic_data(
    executor: &CommandExecutor,
    credentials: &DeviceCredentials,
    interface: &str,
    samples: usize,
    timeout: Duration,
) -> RouterOsResult<Vec<TrafficPoint>> {
    let (mut session, port) = executor.open(credentials).await?;
    let options = ListenOptions {
        max_records: samples,
        timeout,
        one_shot: false,
    };
    let result = session
        .listen(MONITOR_TRAFFIC, &monitor_params(interface, false), options)
        .await;
    session.close().await;

    let ticks: Vec<TrafficSample> = result
        .map_err(|e| command_error(credentials, port, MONITOR_TRAFFIC, e))?
        .iter()
        .filter_map(parse_traffic_sample)
        .collect();
    Ok(ticks
        .iter()
        .zip(tick_times(ticks.len()))
        .map(|(sample, (timestamp, time))| TrafficPoint {
            timestamp,
            time,
            upload: sample.tx_bits_per_second,
            download: sample.rx_bits_per_second,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterOsSettings;
    use crate::mikrotik::error::ErrorKind;
    use crate::mikrotik::testing::{FakeConnector, FakeReply, record};
    use crate::mikrotik::types::Record;
    use std::sync::Arc;

    fn executor(fake: &FakeConnector) -> CommandExecutor {
        CommandExecutor::new(Arc::new(fake.clone()), &RouterOsSettings::default())
    }

    fn creds() -> DeviceCredentials {
        DeviceCredentials::new("10.0.0.1", "admin", "secret")
    }

    fn interface_list() -> Vec<Record> {
        vec![
            record(&[(".id", "*1"), ("name", "ether1"), ("running", "true")]),
            record(&[(".id", "*2"), ("name", "ether2"), ("running", "false")]),
            record(&[(".id", "*3"), ("name", "wlan1"), ("running", "true")]),
        ]
    }

    fn requested(params: &[String]) -> String {
        params
            .iter()
            .find_map(|p| p.strip_prefix("=interface="))
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0), "0 bps");
        assert_eq!(format_rate(500), "500 bps");
        assert_eq!(format_rate(999), "999 bps");
        assert_eq!(format_rate(1_000), "1.0 Kbps");
        assert_eq!(format_rate(45_000), "45.0 Kbps");
        assert_eq!(format_rate(12_500_000), "12.5 Mbps");
    }

    #[test]
    fn test_join_samples_keeps_list_order() {
        let interfaces = parse_interfaces(&interface_list());
        let mut samples = HashMap::new();
        samples.insert(
            "wlan1".to_string(),
            TrafficSample {
                rx_bits_per_second: 500,
                tx_bits_per_second: 45_000,
            },
        );
        samples.insert(
            "ether1".to_string(),
            TrafficSample {
                rx_bits_per_second: 12_500_000,
                tx_bits_per_second: 0,
            },
        );

        let stats = join_samples(&interfaces, &samples);
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ether1", "ether2", "wlan1"]);
        assert_eq!(stats[0].rx_rate, "12.5 Mbps");
        assert_eq!(stats[1].rx_rate, "0 bps");
        assert_eq!(stats[1].tx_rate, "0 bps");
        assert_eq!(stats[1].status, InterfaceStatus::Down);
        assert_eq!(stats[2].tx_rate, "45.0 Kbps");
    }

    #[tokio::test]
    async fn test_failed_sample_does_not_abort_batch() {
        let fake = FakeConnector::new(|path, params| match path {
            INTERFACE_PRINT => FakeReply::Records(interface_list()),
            MONITOR_TRAFFIC => match requested(params).as_str() {
                "ether1" => FakeReply::Records(vec![record(&[
                    ("name", "ether1"),
                    ("rx-bits-per-second", "45000"),
                    ("tx-bits-per-second", "500"),
                ])]),
                "ether2" => FakeReply::Trap("no such item".into()),
                _ => FakeReply::Hang,
            },
            other => panic!("unexpected command {other}"),
        });

        let stats = fetch_interface_stats(&executor(&fake), &creds(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].rx_rate, "45.0 Kbps");
        assert_eq!(stats[0].tx_rate, "500 bps");
        assert_eq!(stats[1].rx_rate, "0 bps");
        assert_eq!(stats[2].rx_rate, "0 bps");
        assert_eq!(stats[2].tx_rate, "0 bps");
        assert_eq!(fake.open_close_counts(), (1, 1));
    }

    fn tick(name: &str, rx: &str, tx: &str) -> FakeReply {
        FakeReply::Records(vec![record(&[
            ("name", name),
            ("rx-bits-per-second", rx),
            ("tx-bits-per-second", tx),
        ])])
    }

    #[tokio::test]
    async fn test_lost_session_is_reopened_mid_batch() {
        let fake = FakeConnector::new(|path, params| match path {
            INTERFACE_PRINT => FakeReply::Records(interface_list()),
            _ => match requested(params).as_str() {
                "ether1" => FakeReply::Hang,
                "ether2" => tick("ether2", "2000", "1000"),
                other => tick(other, "500", "45000"),
            },
        });

        let stats = fetch_interface_stats(&executor(&fake), &creds(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(stats[0].rx_rate, "0 bps");
        assert_eq!(stats[1].rx_rate, "2.0 Kbps");
        assert_eq!(stats[2].tx_rate, "45.0 Kbps");
        assert_eq!(fake.open_close_counts(), (2, 2));
    }

    #[tokio::test]
    async fn test_failed_reopen_keeps_every_interface() {
        let fake = FakeConnector::new(|path, _| match path {
            INTERFACE_PRINT => FakeReply::Records(interface_list()),
            _ => FakeReply::Hang,
        })
        .refusing_after(1);

        let stats = fetch_interface_stats(&executor(&fake), &creds(), Duration::from_secs(1))
            .await
            .unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ether1", "ether2", "wlan1"]);
        assert!(stats.iter().all(|s| s.rx_rate == "0 bps" && s.tx_rate == "0 bps"));
        assert_eq!(fake.open_close_counts(), (1, 1));
        // one sample, then the reopen walks both fallback ports and gives up
        let monitors = fake
            .commands()
            .into_iter()
            .filter(|c| c.starts_with(MONITOR_TRAFFIC))
            .count();
        assert_eq!(monitors, 1);
    }

    #[test]
    fn test_clock_time() {
        assert_eq!(clock_time(0), "00:00:00");
        assert_eq!(clock_time(86_399), "23:59:59");
        assert_eq!(clock_time(1_700_000_000), "22:13:20");
    }

    #[tokio::test]
    async fn test_samples_requested_once_per_interface() {
        let fake = FakeConnector::new(|path, params| match path {
            INTERFACE_PRINT => FakeReply::Records(interface_list()),
            _ => {
                assert!(params.contains(&"=once=".to_string()));
                FakeReply::Records(vec![record(&[
                    ("name", requested(params).as_str()),
                    ("rx-bits-per-second", "1"),
                    ("tx-bits-per-second", "2"),
                ])])
            }
        });

        fetch_interface_stats(&executor(&fake), &creds(), Duration::from_secs(1))
            .await
            .unwrap();
        let monitors: Vec<String> = fake
            .commands()
            .into_iter()
            .filter(|c| c.starts_with(MONITOR_TRAFFIC))
            .collect();
        assert_eq!(monitors.len(), 3);
        assert!(monitors[0].contains("=interface=ether1"));
        assert!(monitors[2].contains("=interface=wlan1"));
    }

    #[tokio::test]
    async fn test_listing_failure_fails_call() {
        let fake = FakeConnector::new(|_, _| FakeReply::Trap("not enough permissions (9)".into()));
        let err = fetch_interface_stats(&executor(&fake), &creds(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Device);
        assert_eq!(fake.open_close_counts(), (1, 1));
    }

    #[tokio::test]
    async fn test_traffic_data_maps_directions() {
        let fake = FakeConnector::new(|_, params| {
            assert!(!params.contains(&"=once=".to_string()));
            FakeReply::Records(vec![
                record(&[("rx-bits-per-second", "100"), ("tx-bits-per-second", "10")]),
                record(&[("rx-bits-per-second", "200"), ("tx-bits-per-second", "20")]),
                record(&[("rx-bits-per-second", "300"), ("tx-bits-per-second", "30")]),
            ])
        });

        let points = fetch_traffic_data(
            &executor(&fake),
            &creds(),
            "ether1",
            2,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].download, 100);
        assert_eq!(points[0].upload, 10);
        assert_eq!(points[1].timestamp, points[0].timestamp + 1);
        assert_eq!(points[1].time, clock_time(points[1].timestamp));
        assert_eq!(fake.open_close_counts(), (1, 1));
    }
}
