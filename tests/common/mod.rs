// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS device simulated over real TCP sockets

#![allow(dead_code)]

use mikrotik_dashboard::{RouterOsSettings, encode_sentence};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Reply sentences for one command, without the `.tag` word
pub type Replies = Vec<Vec<String>>;

type Handler = dyn Fn(&str, &[String]) -> Replies + Send + Sync;

pub fn sentence(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

pub fn done() -> Vec<String> {
    sentence(&["!done"])
}

pub fn trap(message: &str) -> Replies {
    vec![sentence(&["!trap", &format!("=message={message}")]), done()]
}

/// Simulated router accepting `password` on every connection
pub struct SimulatedRouter {
    pub port: u16,
}

impl SimulatedRouter {
    pub async fn start<F>(password: &str, handler: F) -> Self
    where
        F: Fn(&str, &[String]) -> Replies + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let password = password.to_string();
        let handler: Arc<Handler> = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let password = password.clone();
                tokio::spawn(serve(stream, password, handler));
            }
        });

        Self { port }
    }
}

/// A port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

pub fn settings(ports: &[u16]) -> RouterOsSettings {
    RouterOsSettings {
        fallback_ports: ports.to_vec(),
        connect_timeout_secs: 2,
        command_timeout_secs: 2,
        sample_timeout_secs: 1,
    }
}

async fn read_length<R: AsyncRead + Unpin>(stream: &mut R) -> Option<usize> {
    let first = stream.read_u8().await.ok()? as usize;
    if first & 0x80 == 0 {
        Some(first)
    } else {
        let second = stream.read_u8().await.ok()? as usize;
        Some(((first & 0x3F) << 8) + second)
    }
}

async fn read_sentence<R: AsyncRead + Unpin>(stream: &mut R) -> Option<Vec<String>> {
    let mut words = Vec::new();
    loop {
        let len = read_length(stream).await?;
        if len == 0 {
            return Some(words);
        }
        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).await.ok()?;
        words.push(String::from_utf8_lossy(&buf).into_owned());
    }
}

fn attribute<'a>(words: &'a [String], prefix: &str) -> Option<&'a str> {
    words.iter().find_map(|w| w.strip_prefix(prefix))
}

async fn send(stream: &mut TcpStream, mut words: Vec<String>, tag: Option<&str>) -> bool {
    if let Some(tag) = tag {
        words.push(format!(".tag={tag}"));
    }
    stream.write_all(&encode_sentence(&words)).await.is_ok()
}

async fn serve(mut stream: TcpStream, password: String, handler: Arc<Handler>) {
    while let Some(words) = read_sentence(&mut stream).await {
        let Some(command) = words.first().cloned() else {
            continue;
        };
        let tag = attribute(&words, ".tag=").map(str::to_string);

        let replies = match command.as_str() {
            "/login" => {
                if attribute(&words, "=password=") == Some(password.as_str()) {
                    vec![done()]
                } else {
                    trap("invalid user name or password (6)")
                }
            }
            "/cancel" => {
                if let Some(stream_tag) = attribute(&words, "=tag=") {
                    let stream_tag = stream_tag.to_string();
                    if !send(&mut stream, done(), Some(&stream_tag)).await {
                        return;
                    }
                }
                vec![done()]
            }
            _ => {
                let params: Vec<String> = words[1..]
                    .iter()
                    .filter(|w| !w.starts_with(".tag="))
                    .cloned()
                    .collect();
                handler(&command, &params)
            }
        };

        for reply in replies {
            if !send(&mut stream, reply, tag.as_deref()).await {
                return;
            }
        }
    }
}
