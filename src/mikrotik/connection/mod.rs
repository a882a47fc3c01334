// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling
//!
//! [`RouterOsSession`] owns one authenticated API connection and exchanges
//! command/reply sentences over it. [`Connector`] is the seam the executor
//! opens sessions through, so the transport can be replaced in tests.

mod auth;
pub(crate) mod parse;
mod protocol;

use async_trait::async_trait;
use std::net::Ipv6Addr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout, timeout_at};

use super::error::{RouterOsError, RouterOsResult};
use super::types::Record;
use parse::{ReplyKind, Sentence};
pub use protocol::{encode_length, encode_sentence};
use protocol::{read_sentence_words, write_sentence};

/// Budget for draining a cancelled stream back to `!done`
const CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of a session
///
/// `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Ready,
    Executing,
    Listening,
    Closed,
}

/// Stop conditions for [`Session::listen`]
#[derive(Debug, Clone, Copy)]
pub struct ListenOptions {
    /// Stop after this many `!re` records
    pub max_records: usize,
    /// Stop when this much time has passed since the command was sent
    pub timeout: Duration,
    /// The command ends by itself (`=once=`): read through to its `!done`
    /// instead of cancelling once `max_records` arrived
    pub one_shot: bool,
}

/// One authenticated connection to a device
#[async_trait]
pub trait Session: Send {
    /// Runs one command and returns every reply record in order.
    ///
    /// Attributes carried by the final `!done` (such as `ret`) are appended
    /// as a last record.
    async fn execute(&mut self, path: &str, params: &[String]) -> RouterOsResult<Vec<Record>>;

    /// Runs a streaming command and collects its records until `max_records`
    /// arrive, the device ends the stream, or the timeout elapses.
    ///
    /// A stream that is still running when collection stops is cancelled,
    /// unless `one_shot` is set. Fails with a timeout only when nothing
    /// arrived before the deadline.
    async fn listen(
        &mut self,
        path: &str,
        params: &[String],
        options: ListenOptions,
    ) -> RouterOsResult<Vec<Record>>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&mut self);

    fn state(&self) -> SessionState;
}

/// Opens authenticated sessions
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects and logs in within `timeout`.
    ///
    /// Nothing stays open when this fails.
    async fn open(
        &self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> RouterOsResult<Box<dyn Session>>;
}

/// Connector backed by plain TCP API connections
#[derive(Debug, Clone)]
pub struct TcpConnector {
    command_timeout: Duration,
}

impl TcpConnector {
    #[must_use]
    pub fn new(command_timeout: Duration) -> Self {
        Self { command_timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn open(
        &self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> RouterOsResult<Box<dyn Session>> {
        let session =
            RouterOsSession::open(host, port, username, password, timeout, self.command_timeout)
                .await?;
        Ok(Box::new(session))
    }
}

/// Formats `host:port`, bracketing IPv6 literals
pub(crate) fn socket_addr(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn command_words(path: &str, params: &[String], tag: Option<&str>) -> Vec<String> {
    let mut words: Vec<String> = Vec::with_capacity(2 + params.len());
    words.push(path.to_string());
    words.extend(params.iter().cloned());
    if let Some(tag) = tag {
        words.push(format!(".tag={tag}"));
    }
    words
}

/// Low-level RouterOS API connection
pub struct RouterOsSession<S = TcpStream> {
    stream: S,
    peer: String,
    state: SessionState,
    command_timeout: Duration,
    next_tag: u32,
}

impl RouterOsSession<TcpStream> {
    /// Connects to `host:port` and logs in, all within `open_timeout`
    pub async fn open(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        open_timeout: Duration,
        command_timeout: Duration,
    ) -> RouterOsResult<Self> {
        let addr = socket_addr(host, port);
        let deadline = Instant::now() + open_timeout;

        tracing::trace!("Attempting TCP connection to: {}", addr);
        let stream = match timeout_at(deadline, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(RouterOsError::Connect { addr, source }),
            Err(_) => {
                return Err(RouterOsError::Timeout {
                    operation: "connect",
                    after: open_timeout,
                });
            }
        };
        tracing::trace!("TCP connection established to: {}", addr);

        let remaining = deadline.saturating_duration_since(Instant::now());
        Self::establish(stream, addr, username, password, remaining, command_timeout).await
    }
}

impl<S> RouterOsSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Logs in over an already connected stream
    pub async fn establish(
        stream: S,
        peer: impl Into<String>,
        username: &str,
        password: &str,
        login_timeout: Duration,
        command_timeout: Duration,
    ) -> RouterOsResult<Self> {
        let mut session = Self {
            stream,
            peer: peer.into(),
            state: SessionState::Connecting,
            command_timeout,
            next_tag: 0,
        };

        let result = match timeout(login_timeout, session.login(username, password)).await {
            Ok(result) => result,
            Err(_) => Err(RouterOsError::Timeout {
                operation: "login",
                after: login_timeout,
            }),
        };

        match result {
            Ok(()) => {
                session.state = SessionState::Ready;
                Ok(session)
            }
            Err(e) => {
                session.teardown().await;
                Err(e)
            }
        }
    }

    fn ensure_ready(&self) -> RouterOsResult<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Closed => Err(RouterOsError::ClosedSession),
            other => Err(RouterOsError::Protocol(format!(
                "session busy ({other:?})"
            ))),
        }
    }

    fn next_tag(&mut self) -> String {
        self.next_tag = self.next_tag.wrapping_add(1);
        self.next_tag.to_string()
    }

    async fn read_sentence(&mut self) -> RouterOsResult<Sentence> {
        let words = read_sentence_words(&mut self.stream).await?;
        Sentence::from_words(words)
    }

    /// Sends one sentence and reads replies up to `!done`
    async fn exchange(&mut self, words: &[String]) -> RouterOsResult<Vec<Record>> {
        write_sentence(&mut self.stream, words).await?;

        let mut records = Vec::new();
        let mut trap: Option<String> = None;
        loop {
            let sentence = self.read_sentence().await?;
            match sentence.kind {
                ReplyKind::Re => records.push(sentence.attributes),
                ReplyKind::Trap => {
                    tracing::trace!("Trap received: {:?}", sentence.attributes);
                    trap = Some(sentence.message());
                }
                ReplyKind::Done => {
                    if !sentence.attributes.is_empty() {
                        records.push(sentence.attributes);
                    }
                    break;
                }
                ReplyKind::Fatal => {
                    return Err(RouterOsError::Protocol(format!(
                        "fatal: {}",
                        sentence.message()
                    )));
                }
            }
        }

        tracing::trace!("Command complete, {} sentences received", records.len());
        match trap {
            Some(message) => Err(RouterOsError::Device { message }),
            None => Ok(records),
        }
    }

    /// Cancels the stream tagged `tag` and drains until both it and the
    /// cancel request report `!done`
    async fn cancel(&mut self, tag: &str) -> RouterOsResult<()> {
        let cancel_tag = self.next_tag();
        let words = [
            "/cancel".to_string(),
            format!("=tag={tag}"),
            format!(".tag={cancel_tag}"),
        ];
        write_sentence(&mut self.stream, &words).await?;

        timeout(CANCEL_TIMEOUT, async {
            let mut stream_done = false;
            let mut cancel_done = false;
            while !(stream_done && cancel_done) {
                let sentence = self.read_sentence().await?;
                match sentence.kind {
                    ReplyKind::Done => match sentence.tag.as_deref() {
                        Some(t) if t == tag => stream_done = true,
                        Some(t) if t == cancel_tag => cancel_done = true,
                        _ => {}
                    },
                    ReplyKind::Fatal => {
                        return Err(RouterOsError::Protocol(format!(
                            "fatal: {}",
                            sentence.message()
                        )));
                    }
                    _ => {}
                }
            }
            Ok(())
        })
        .await
        .map_err(|_| RouterOsError::Timeout {
            operation: "cancel",
            after: CANCEL_TIMEOUT,
        })?
    }

    async fn teardown(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!("Shutdown of {} failed: {}", self.peer, e);
        }
        tracing::trace!("Connection to {} closed", self.peer);
    }
}

#[async_trait]
impl<S> Session for RouterOsSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn execute(&mut self, path: &str, params: &[String]) -> RouterOsResult<Vec<Record>> {
        self.ensure_ready()?;
        self.state = SessionState::Executing;
        tracing::debug!("Executing {} on {}", path, self.peer);

        let words = command_words(path, params, None);
        let limit = self.command_timeout;
        let outcome = timeout(limit, self.exchange(&words)).await;

        match outcome {
            Ok(Ok(records)) => {
                self.state = SessionState::Ready;
                Ok(records)
            }
            Ok(Err(e @ RouterOsError::Device { .. })) => {
                self.state = SessionState::Ready;
                Err(e)
            }
            Ok(Err(e)) => {
                self.teardown().await;
                Err(e)
            }
            Err(_) => {
                self.teardown().await;
                Err(RouterOsError::Timeout {
                    operation: "command",
                    after: limit,
                })
            }
        }
    }

    async fn listen(
        &mut self,
        path: &str,
        params: &[String],
        options: ListenOptions,
    ) -> RouterOsResult<Vec<Record>> {
        self.ensure_ready()?;
        self.state = SessionState::Listening;
        tracing::debug!("Listening on {} at {}", path, self.peer);

        let tag = self.next_tag();
        let words = command_words(path, params, Some(&tag));
        if let Err(e) = write_sentence(&mut self.stream, &words).await {
            self.teardown().await;
            return Err(e);
        }

        let deadline = Instant::now() + options.timeout;
        let mut records = Vec::new();
        let mut trap: Option<String> = None;
        let finished = loop {
            if records.len() >= options.max_records && !options.one_shot {
                break false;
            }
            let sentence = match timeout_at(deadline, self.read_sentence()).await {
                Err(_) => break false,
                Ok(Err(e)) => {
                    self.teardown().await;
                    return Err(e);
                }
                Ok(Ok(sentence)) => sentence,
            };
            if sentence.kind == ReplyKind::Fatal {
                self.teardown().await;
                return Err(RouterOsError::Protocol(format!(
                    "fatal: {}",
                    sentence.message()
                )));
            }
            if sentence.tag.as_deref() != Some(tag.as_str()) {
                tracing::trace!("Ignoring sentence for tag {:?}", sentence.tag);
                continue;
            }
            match sentence.kind {
                ReplyKind::Re if records.len() < options.max_records => {
                    records.push(sentence.attributes);
                }
                ReplyKind::Re => {}
                ReplyKind::Trap => trap = Some(sentence.message()),
                _ => break true,
            }
        };

        if finished {
            self.state = SessionState::Ready;
        } else {
            match self.cancel(&tag).await {
                Ok(()) => self.state = SessionState::Ready,
                Err(e) => {
                    tracing::warn!("Failed to cancel stream on {}: {}", self.peer, e);
                    self.teardown().await;
                }
            }
        }

        if let Some(message) = trap {
            return Err(RouterOsError::Device { message });
        }
        if records.is_empty() && !finished {
            return Err(RouterOsError::Timeout {
                operation: "listen",
                after: options.timeout,
            });
        }
        Ok(records)
    }

    async fn close(&mut self) {
        self.teardown().await;
    }

    fn state(&self) -> SessionState {
        self.state
    }
}
