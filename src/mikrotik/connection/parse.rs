// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS response parsing helpers

use crate::mikrotik::error::{RouterOsError, RouterOsResult};
use crate::mikrotik::types::{
    InterfaceInfo, PppoeUser, Record, SystemResource, TrafficSample,
};

/// Reply word that opens a sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReplyKind {
    Re,
    Done,
    Trap,
    Fatal,
}

/// One reply sentence split into its parts
#[derive(Debug, Clone)]
pub(crate) struct Sentence {
    pub kind: ReplyKind,
    pub attributes: Record,
    pub tag: Option<String>,
    /// Bare words after the reply word (`!fatal` carries its reason this way)
    pub extra: Vec<String>,
}

impl Sentence {
    pub(crate) fn from_words(words: Vec<String>) -> RouterOsResult<Self> {
        let mut iter = words.into_iter();
        let head = iter
            .next()
            .ok_or_else(|| RouterOsError::Protocol("empty sentence".to_string()))?;
        let kind = match head.as_str() {
            "!re" => ReplyKind::Re,
            "!done" => ReplyKind::Done,
            "!trap" => ReplyKind::Trap,
            "!fatal" => ReplyKind::Fatal,
            other => {
                return Err(RouterOsError::Protocol(format!(
                    "unexpected reply word '{other}'"
                )));
            }
        };

        let mut attributes = Record::new();
        let mut tag = None;
        let mut extra = Vec::new();
        for word in iter {
            if let Some(stripped) = word.strip_prefix('=') {
                if let Some((k, v)) = stripped.split_once('=') {
                    attributes.insert(k.to_string(), v.to_string());
                } else {
                    attributes.insert(stripped.to_string(), String::new());
                }
            } else if let Some(t) = word.strip_prefix(".tag=") {
                tag = Some(t.to_string());
            } else {
                extra.push(word);
            }
        }

        Ok(Self {
            kind,
            attributes,
            tag,
            extra,
        })
    }

    pub(crate) fn message(&self) -> String {
        self.attributes
            .get("message")
            .cloned()
            .or_else(|| (!self.extra.is_empty()).then(|| self.extra.join(" ")))
            .unwrap_or_else(|| "trap".to_string())
    }
}

fn number(record: &Record, key: &str) -> u64 {
    record.get(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn text(record: &Record, key: &str, fallback: &str) -> String {
    record
        .get(key)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

pub(crate) fn parse_system(records: &[Record]) -> SystemResource {
    let first_opt = records
        .iter()
        .find(|s| s.contains_key("total-memory") || s.contains_key("cpu-load"));
    let empty = Record::new();
    let first = first_opt.unwrap_or(&empty);
    SystemResource {
        uptime: text(first, "uptime", "0s"),
        cpu_load: number(first, "cpu-load"),
        free_memory: number(first, "free-memory"),
        total_memory: number(first, "total-memory"),
    }
}

pub(crate) fn parse_interfaces(records: &[Record]) -> Vec<InterfaceInfo> {
    records
        .iter()
        .filter_map(|s| {
            let name = s.get("name")?;
            Some(InterfaceInfo {
                id: s.get(".id").cloned().unwrap_or_else(|| name.clone()),
                name: name.clone(),
                running: s.get("running").is_some_and(|v| v == "true"),
            })
        })
        .collect()
}

/// Extracts the first traffic tick, or `None` if the record carries no rates
pub(crate) fn parse_traffic_sample(record: &Record) -> Option<TrafficSample> {
    if !record.contains_key("rx-bits-per-second") && !record.contains_key("tx-bits-per-second") {
        return None;
    }
    Some(TrafficSample {
        rx_bits_per_second: number(record, "rx-bits-per-second"),
        tx_bits_per_second: number(record, "tx-bits-per-second"),
    })
}

pub(crate) fn parse_ppp_active(records: &[Record]) -> Vec<PppoeUser> {
    records
        .iter()
        .filter_map(|s| {
            let name = s.get("name")?;
            Some(PppoeUser {
                id: s.get(".id").cloned().unwrap_or_else(|| name.clone()),
                name: name.clone(),
                service: text(s, "service", "pppoe"),
                ip_address: text(s, "address", "N/A"),
                uptime: text(s, "uptime", "0s"),
                upload: "N/A".to_string(),
                download: "N/A".to_string(),
            })
        })
        .collect()
}

pub(crate) fn parse_profile_names(records: &[Record]) -> Vec<String> {
    records.iter().filter_map(|s| s.get("name").cloned()).collect()
}

/// Reads the `=ret=` value a `count-only` query leaves in its `!done`
pub(crate) fn parse_count(records: &[Record]) -> RouterOsResult<u64> {
    let ret = records
        .iter()
        .rev()
        .find_map(|s| s.get("ret"))
        .ok_or_else(|| RouterOsError::Protocol("count-only reply without 'ret'".to_string()))?;
    ret.parse()
        .map_err(|_| RouterOsError::Protocol(format!("invalid count '{ret}'")))
}
