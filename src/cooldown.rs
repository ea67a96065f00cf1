// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-local action cooldowns.
//!
//! Expiry instants are stored as epoch milliseconds under `cooldown_{action}`
//! in a [`KeyValueStore`]. Best-effort: unreadable entries count as expired.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageResult};

const KEY_PREFIX: &str = "cooldown_";

/// Wall-clock source in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub struct GameCooldown {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl GameCooldown {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Start a cooldown of `minutes` for `action`, replacing any existing one.
    pub fn set_cooldown(&self, action: &str, minutes: u32) -> StorageResult<()> {
        let expires_at = self
            .clock
            .now_ms()
            .saturating_add(i64::from(minutes) * 60_000);
        self.store
            .set(&cooldown_key(action), &expires_at.to_string())?;
        debug!(action = %action, expires_at, "Cooldown set");
        Ok(())
    }

    /// Milliseconds until `action` is available again, 0 when not cooling down.
    pub fn get_cooldown_remaining(&self, action: &str) -> u64 {
        let stored = match self.store.get(&cooldown_key(action)) {
            Ok(Some(value)) => value,
            Ok(None) => return 0,
            Err(e) => {
                warn!(action = %action, error = %e, "Failed to read cooldown");
                return 0;
            }
        };
        let Ok(expires_at) = stored.trim().parse::<i64>() else {
            return 0;
        };
        expires_at
            .checked_sub(self.clock.now_ms())
            .and_then(|remaining| u64::try_from(remaining).ok())
            .unwrap_or(0)
    }

    pub fn is_on_cooldown(&self, action: &str) -> bool {
        self.get_cooldown_remaining(action) > 0
    }
}

fn cooldown_key(action: &str) -> String {
    format!("{KEY_PREFIX}{action}")
}

/// Render a duration as `"{minutes}m {seconds}s"`.
pub fn format_cooldown_time(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{minutes}m {seconds}s")
}
