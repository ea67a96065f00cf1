// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the welcome-bonus endpoint.
//!
//! `POST {url}` with `{"wallet": "<address>"}`; the service answers
//! `{"success": true}` or `{"success": false, "error": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bonus::{BonusError, BonusService};

#[derive(Debug, Serialize)]
struct BonusRequest<'a> {
    wallet: &'a str,
}

#[derive(Debug, Deserialize)]
struct BonusResponse {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpBonusService {
    url: String,
    http: Client,
}

impl HttpBonusService {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[async_trait]
impl BonusService for HttpBonusService {
    async fn disburse(&self, wallet_address: &str) -> Result<(), BonusError> {
        let response = self
            .http
            .post(&self.url)
            .json(&BonusRequest {
                wallet: wallet_address,
            })
            .send()
            .await
            .map_err(|e| BonusError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BonusError::Unavailable(format!("{status}: {body}")));
        }

        let body: BonusResponse = response
            .json()
            .await
            .map_err(|e| BonusError::InvalidResponse(e.to_string()))?;
        debug!(success = body.success, "Bonus service responded");

        interpret(body)
    }
}

/// Stand-in used when no bonus endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredBonusService;

#[async_trait]
impl BonusService for UnconfiguredBonusService {
    async fn disburse(&self, _wallet_address: &str) -> Result<(), BonusError> {
        Err(BonusError::Unavailable("no bonus endpoint configured".into()))
    }
}

fn interpret(body: BonusResponse) -> Result<(), BonusError> {
    if body.success {
        Ok(())
    } else {
        Err(BonusError::Rejected(
            body.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
