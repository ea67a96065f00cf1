// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the client. Configuration is loaded from the environment at
//! startup; command-line flags override individual values.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FIREBASE_API_KEY` | Web API key of the Firebase project | Required for auth and Firestore |
//! | `FIREBASE_PROJECT_ID` | Firebase project id | Required for the Firestore backend |
//! | `BONUS_URL` | Welcome-bonus endpoint | Optional (bonus reported unavailable) |
//! | `RPC_URL` | Ethereum JSON-RPC endpoint | public Sepolia node |
//! | `TOKEN_ADDRESS` | ERC-20 contract address | S2 token on Sepolia |
//! | `TOKEN_SYMBOL` | Display symbol | `S2` |
//! | `STORE_BACKEND` | `firestore`, `redb` or `memory` | `firestore` |
//! | `DATA_DIR` | Directory for the redb file and local state | `./s2-data` |
//! | `KEY_EXPORT_DIR` | Where private key backups are written | `.` |
//! | `HTTP_TIMEOUT_SECS` | Timeout for hosted service calls | `15` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::blockchain::{parse_address, TokenConfig, SEPOLIA_DEFAULT_RPC_URL};
use crate::logging::LogFormat;

/// Environment variable name for the Firebase web API key.
pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";

/// Environment variable name for the Firebase project id.
///
/// Only the Firestore backend needs it; documents live under
/// `projects/{id}/databases/(default)/documents/users`.
pub const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";

pub const BONUS_URL_ENV: &str = "BONUS_URL";

/// Environment variable name for the JSON-RPC endpoint.
///
/// # Default
/// [`SEPOLIA_DEFAULT_RPC_URL`]
pub const RPC_URL_ENV: &str = "RPC_URL";

pub const TOKEN_ADDRESS_ENV: &str = "TOKEN_ADDRESS";
pub const TOKEN_SYMBOL_ENV: &str = "TOKEN_SYMBOL";

/// Environment variable name for the user store backend.
pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";

/// Environment variable name for the local data directory.
///
/// Holds `users.redb` (redb backend) and `local_state.json` (cooldowns).
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./s2-data";

pub const KEY_EXPORT_DIR_ENV: &str = "KEY_EXPORT_DIR";
pub const DEFAULT_KEY_EXPORT_DIR: &str = ".";

pub const HTTP_TIMEOUT_SECS_ENV: &str = "HTTP_TIMEOUT_SECS";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// File name of the redb user database inside the data directory.
pub const USER_DB_FILE: &str = "users.redb";

/// File name of the client-local key/value state inside the data directory.
pub const LOCAL_STATE_FILE: &str = "local_state.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where user records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreBackend {
    Firestore,
    Redb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "redb" => Ok(StoreBackend::Redb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown backend \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub firebase_api_key: Option<String>,
    pub firebase_project_id: Option<String>,
    pub bonus_url: Option<Url>,
    pub rpc_url: Url,
    pub token: TokenConfig,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub key_export_dir: PathBuf,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bonus_url = var(BONUS_URL_ENV)
            .map(|raw| parse_url(BONUS_URL_ENV, &raw))
            .transpose()?;
        let rpc_url = parse_url(
            RPC_URL_ENV,
            &var(RPC_URL_ENV).unwrap_or_else(|| SEPOLIA_DEFAULT_RPC_URL.to_string()),
        )?;

        let mut token = TokenConfig::default();
        if let Some(address) = var(TOKEN_ADDRESS_ENV) {
            parse_address(&address).map_err(|e| ConfigError::Invalid {
                name: TOKEN_ADDRESS_ENV,
                reason: e.to_string(),
            })?;
            token.address = address;
        }
        if let Some(symbol) = var(TOKEN_SYMBOL_ENV) {
            token.symbol = symbol;
        }

        let store_backend = match var(STORE_BACKEND_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: STORE_BACKEND_ENV,
                reason,
            })?,
            None => StoreBackend::Firestore,
        };

        let http_timeout_secs = match var(HTTP_TIMEOUT_SECS_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: HTTP_TIMEOUT_SECS_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let log_format = match var(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                reason,
            })?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            firebase_api_key: var(FIREBASE_API_KEY_ENV),
            firebase_project_id: var(FIREBASE_PROJECT_ID_ENV),
            bonus_url,
            rpc_url,
            token,
            store_backend,
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            key_export_dir: PathBuf::from(
                var(KEY_EXPORT_DIR_ENV).unwrap_or_else(|| DEFAULT_KEY_EXPORT_DIR.into()),
            ),
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_format,
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.firebase_api_key
            .as_deref()
            .ok_or(ConfigError::Missing(FIREBASE_API_KEY_ENV))
    }

    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        self.firebase_project_id
            .as_deref()
            .ok_or(ConfigError::Missing(FIREBASE_PROJECT_ID_ENV))
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.data_dir.join(USER_DB_FILE)
    }

    pub fn local_state_path(&self) -> PathBuf {
        self.data_dir.join(LOCAL_STATE_FILE)
    }
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("unsupported scheme \"{other}\""),
        }),
    }
}
