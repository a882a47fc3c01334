// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS wire protocol helpers
//!
//! A sentence is a sequence of length-prefixed words closed by an empty word.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::mikrotik::error::{RouterOsError, RouterOsResult};

// RouterOS protocol length encoding - intentional truncation is part of the wire format
#[allow(clippy::cast_possible_truncation)]
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        vec![len as u8]
    } else if len < 0x4000 {
        vec![((len >> 8) as u8) | 0x80, (len & 0xFF) as u8]
    } else if len < 0x0020_0000 {
        vec![
            ((len >> 16) as u8) | 0xC0,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    } else if len < 0x1000_0000 {
        vec![
            ((len >> 24) as u8) | 0xE0,
            ((len >> 16) & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    } else {
        vec![
            0xF0,
            ((len >> 24) & 0xFF) as u8,
            ((len >> 16) & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            (len & 0xFF) as u8,
        ]
    }
}

/// Encodes a full sentence, including the terminating empty word
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        out.extend_from_slice(&encode_length(bytes.len()));
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

pub(crate) async fn read_length<R>(stream: &mut R) -> RouterOsResult<usize>
where
    R: AsyncRead + Unpin,
{
    let first = stream.read_u8().await?;
    let len = if first & 0x80 == 0 {
        first as usize
    } else if first & 0xC0 == 0x80 {
        let second = stream.read_u8().await?;
        (((first & 0x3F) as usize) << 8) + second as usize
    } else if first & 0xE0 == 0xC0 {
        let second = stream.read_u8().await?;
        let third = stream.read_u8().await?;
        (((first & 0x1F) as usize) << 16) + ((second as usize) << 8) + third as usize
    } else if first & 0xF0 == 0xE0 {
        let second = stream.read_u8().await?;
        let third = stream.read_u8().await?;
        let fourth = stream.read_u8().await?;
        (((first & 0x0F) as usize) << 24)
            + ((second as usize) << 16)
            + ((third as usize) << 8)
            + fourth as usize
    } else if first == 0xF0 {
        let b2 = stream.read_u8().await?;
        let b3 = stream.read_u8().await?;
        let b4 = stream.read_u8().await?;
        let b5 = stream.read_u8().await?;
        (b2 as usize) << 24 | (b3 as usize) << 16 | (b4 as usize) << 8 | b5 as usize
    } else {
        return Err(RouterOsError::Protocol(format!(
            "unsupported control byte {first:#04X}"
        )));
    };
    Ok(len)
}

pub(crate) async fn read_word<R>(stream: &mut R) -> RouterOsResult<String>
where
    R: AsyncRead + Unpin,
{
    let len = read_length(stream).await?;
    if len == 0 {
        return Ok(String::new());
    }
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into())
}

/// Reads words up to and excluding the terminating empty word
pub(crate) async fn read_sentence_words<R>(stream: &mut R) -> RouterOsResult<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut words = Vec::new();
    loop {
        let word = read_word(stream).await?;
        if word.is_empty() {
            if words.is_empty() {
                // stray terminator between sentences
                continue;
            }
            return Ok(words);
        }
        tracing::trace!("Received word: {}", word);
        words.push(word);
    }
}

pub(crate) async fn write_sentence<W, S>(stream: &mut W, words: &[S]) -> RouterOsResult<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    stream.write_all(&encode_sentence(words)).await?;
    stream.flush().await?;
    Ok(())
}
