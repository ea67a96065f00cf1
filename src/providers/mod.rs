// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hosted service adapters.
//!
//! - [`firebase_auth`]: identity provider (Identity Toolkit REST)
//! - [`firestore`]: user document store (Firestore REST)
//! - [`bonus`]: welcome-bonus endpoint
//!
//! The auth client and the document store share an [`IdTokenCell`] so that
//! document requests run as the signed-in user, which is what the
//! project's security rules check.

pub mod bonus;
pub mod firebase_auth;
pub mod firestore;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Client;

pub use bonus::{HttpBonusService, UnconfiguredBonusService};
pub use firebase_auth::FirebaseAuthClient;
pub use firestore::FirestoreUserStore;

/// The current user's ID token, shared between hosted adapters.
#[derive(Debug, Clone, Default)]
pub struct IdTokenCell {
    inner: Arc<RwLock<Option<String>>>,
}

impl IdTokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Shared HTTP client for the hosted adapters.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}
