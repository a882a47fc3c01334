// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication

use md5::compute as md5_compute;
use tokio::io::{AsyncRead, AsyncWrite};

use super::RouterOsSession;
use crate::mikrotik::error::{RouterOsError, RouterOsResult};

/// Builds the legacy challenge response: `00` + hex(md5(0x00 + password + challenge))
pub(crate) fn challenge_response(password: &str, challenge: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
    data.push(0u8);
    data.extend_from_slice(password.as_bytes());
    data.extend_from_slice(challenge);
    let digest = md5_compute(&data);
    let mut response = String::from("00");
    response.push_str(&hex::encode(digest.0));
    response
}

fn rejected(e: RouterOsError) -> RouterOsError {
    match e {
        RouterOsError::Device { message } => RouterOsError::Auth(message),
        other => other,
    }
}

impl<S> RouterOsSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) async fn login(&mut self, username: &str, password: &str) -> RouterOsResult<()> {
        tracing::trace!("Attempting login for user: {}", username);
        // Plaintext login (RouterOS 6.43+); older firmware answers with a challenge
        let sentences = self
            .exchange(&[
                "/login".to_string(),
                format!("=name={username}"),
                format!("=password={password}"),
            ])
            .await
            .map_err(rejected)?;

        let Some(challenge_hex) = sentences.iter().find_map(|s| s.get("ret")).cloned() else {
            tracing::debug!("Login successful (new method)");
            return Ok(());
        };

        tracing::trace!("Challenge received, length: {}", challenge_hex.len());
        let challenge = hex::decode(&challenge_hex)
            .map_err(|e| RouterOsError::Protocol(format!("invalid login challenge: {e}")))?;

        self.exchange(&[
            "/login".to_string(),
            format!("=name={username}"),
            format!("=response={}", challenge_response(password, &challenge)),
        ])
        .await
        .map_err(rejected)?;

        tracing::debug!("Login successful (legacy method)");
        Ok(())
    }
}
