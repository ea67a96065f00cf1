// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Persisted and exchanged data structures. [`UserRecord`] is the single
//! per-identity document; field names serialize in camelCase so documents
//! written by the web client and by this crate are interchangeable.
//!
//! ## Model Categories
//!
//! - **User records**: profile, wallet and earnings document
//! - **Updates**: partial merges applied by a [`crate::storage::UserStore`]
//! - **Provisioned wallets**: the one-time view of a freshly created key

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth Provider
// =============================================================================

/// How the identity behind a record signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password
    Email,
    /// Google OAuth
    Google,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::Email => write!(f, "email"),
            AuthProvider::Google => write!(f, "google"),
        }
    }
}

// =============================================================================
// User Record
// =============================================================================

/// The persisted profile, wallet and earnings document for one identity.
///
/// `wallet_address` and `private_key` are assigned once at creation and are
/// never rotated. `bonus_given` moves from `false` to `true` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub email: String,
    pub username: String,
    pub wallet_address: String,
    /// Hex private key (`0x` + 64 hex). Stored in plaintext for compatibility
    /// with existing documents.
    pub private_key: String,
    pub bonus_given: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub email_verified: bool,
    pub auth_provider: AuthProvider,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub games_earnings: BTreeMap<String, u64>,
}

impl UserRecord {
    /// Sum of all per-game counters.
    pub fn total_earnings(&self) -> u64 {
        self.games_earnings
            .values()
            .fold(0u64, |sum, value| sum.saturating_add(*value))
    }

    /// Apply a partial update using `now` for timestamp sentinels.
    pub fn apply(&mut self, update: &UserUpdate, now: DateTime<Utc>) {
        match update {
            UserUpdate::BonusGiven(value) => self.bonus_given = *value,
            UserUpdate::EmailVerified(value) => self.email_verified = *value,
            UserUpdate::TouchLastLogin => self.last_login = Some(now),
            UserUpdate::TouchLastCheckIn => self.last_check_in = Some(now),
        }
    }
}

/// A single field change merged into an existing [`UserRecord`].
///
/// The `Touch*` variants are server-timestamp sentinels: the store stamps the
/// field with its own clock rather than trusting the caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserUpdate {
    BonusGiven(bool),
    EmailVerified(bool),
    TouchLastLogin,
    TouchLastCheckIn,
}

// =============================================================================
// Provisioned Wallet
// =============================================================================

/// Result of provisioning: the only time the private key leaves the flow.
///
/// The key is not recoverable through this crate afterwards; callers are
/// expected to export it (see [`crate::export`]).
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisionedWallet {
    pub username: String,
    pub wallet_address: String,
    pub private_key: String,
}

impl std::fmt::Debug for ProvisionedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionedWallet")
            .field("username", &self.username)
            .field("wallet_address", &self.wallet_address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Pick the username for a new record.
///
/// Explicit username first, then the identity's display name, then the local
/// part of the email address.
pub fn derive_username(explicit: Option<&str>, display_name: Option<&str>, email: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| display_name.map(str::trim).filter(|name| !name.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string())
}
