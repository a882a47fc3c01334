// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Scripted in-memory device used by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::connection::{Connector, ListenOptions, Session, SessionState};
use super::error::{RouterOsError, RouterOsResult};
use super::types::Record;

/// How the fake answers one command
#[derive(Clone)]
pub(crate) enum FakeReply {
    Records(Vec<Record>),
    /// Answers after a delay
    Slow(Duration, Vec<Record>),
    Trap(String),
    /// Never answers; surfaces as a timeout and tears the session down
    Hang,
}

/// How the fake fails an open attempt on a port
#[derive(Clone)]
pub(crate) enum OpenFailure {
    Refused,
    Auth(String),
    Timeout,
}

type Handler = dyn Fn(&str, &[String]) -> FakeReply + Send + Sync;

#[derive(Default)]
struct Counters {
    opened_ports: Vec<u16>,
    opens: usize,
    closes: usize,
    commands: Vec<String>,
}

#[derive(Clone)]
pub(crate) struct FakeConnector {
    counters: Arc<Mutex<Counters>>,
    open_failures: Arc<HashMap<u16, OpenFailure>>,
    max_opens: Option<usize>,
    handler: Arc<Handler>,
}

pub(crate) fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

impl FakeConnector {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[String]) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            counters: Arc::default(),
            open_failures: Arc::default(),
            max_opens: None,
            handler: Arc::new(handler),
        }
    }

    pub(crate) fn failing_on(mut self, port: u16, failure: OpenFailure) -> Self {
        Arc::make_mut(&mut self.open_failures).insert(port, failure);
        self
    }

    /// Refuses every open after the first `limit` successful ones
    pub(crate) fn refusing_after(mut self, limit: usize) -> Self {
        self.max_opens = Some(limit);
        self
    }

    pub(crate) fn opened_ports(&self) -> Vec<u16> {
        self.counters.lock().unwrap().opened_ports.clone()
    }

    /// Successful opens and close calls
    pub(crate) fn open_close_counts(&self) -> (usize, usize) {
        let c = self.counters.lock().unwrap();
        (c.opens, c.closes)
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.counters.lock().unwrap().commands.clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(
        &self,
        _host: &str,
        port: u16,
        _username: &str,
        _password: &str,
        timeout: Duration,
    ) -> RouterOsResult<Box<dyn Session>> {
        self.counters.lock().unwrap().opened_ports.push(port);
        let exhausted = self
            .max_opens
            .is_some_and(|limit| self.counters.lock().unwrap().opens >= limit);
        if exhausted {
            return Err(RouterOsError::Connect {
                addr: format!("fake:{port}"),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }
        if let Some(failure) = self.open_failures.get(&port) {
            return Err(match failure {
                OpenFailure::Refused => RouterOsError::Connect {
                    addr: format!("fake:{port}"),
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                },
                OpenFailure::Auth(message) => RouterOsError::Auth(message.clone()),
                OpenFailure::Timeout => RouterOsError::Timeout {
                    operation: "connect",
                    after: timeout,
                },
            });
        }
        self.counters.lock().unwrap().opens += 1;
        Ok(Box::new(FakeSession {
            connector: self.clone(),
            state: SessionState::Ready,
        }))
    }
}

struct FakeSession {
    connector: FakeConnector,
    state: SessionState,
}

impl FakeSession {
    async fn answer(&mut self, path: &str, params: &[String]) -> RouterOsResult<Vec<Record>> {
        if self.state == SessionState::Closed {
            return Err(RouterOsError::ClosedSession);
        }
        let mut line = path.to_string();
        for p in params {
            line.push(' ');
            line.push_str(p);
        }
        self.connector.counters.lock().unwrap().commands.push(line);
        let reply = (self.connector.handler)(path, params);
        match reply {
            FakeReply::Records(records) => Ok(records),
            FakeReply::Slow(delay, records) => {
                tokio::time::sleep(delay).await;
                Ok(records)
            }
            FakeReply::Trap(message) => Err(RouterOsError::Device { message }),
            FakeReply::Hang => {
                self.state = SessionState::Closed;
                Err(RouterOsError::Timeout {
                    operation: "command",
                    after: Duration::from_secs(1),
                })
            }
        }
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn execute(&mut self, path: &str, params: &[String]) -> RouterOsResult<Vec<Record>> {
        self.answer(path, params).await
    }

    async fn listen(
        &mut self,
        path: &str,
        params: &[String],
        options: ListenOptions,
    ) -> RouterOsResult<Vec<Record>> {
        let mut records = self.answer(path, params).await?;
        records.truncate(options.max_records);
        Ok(records)
    }

    async fn close(&mut self) {
        self.state = SessionState::Closed;
        self.connector.counters.lock().unwrap().closes += 1;
    }

    fn state(&self) -> SessionState {
        self.state
    }
}
