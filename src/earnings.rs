// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-game coin counters stored on the user's record.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::Session;
use crate::error::AppError;
use crate::storage::UserStore;

/// Earnings view for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Earnings {
    /// A single game's counter
    Game(u64),
    /// Every counter by game name
    All(BTreeMap<String, u64>),
}

#[derive(Clone)]
pub struct GameEarnings {
    store: Arc<dyn UserStore>,
}

impl GameEarnings {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Add `amount` to the game's counter. The store applies the increment
    /// atomically, so concurrent calls never lose coins.
    pub async fn add_coins(
        &self,
        session: &Session,
        game: &str,
        amount: u64,
    ) -> Result<(), AppError> {
        let uid = session.uid();
        self.store.increment_earnings(uid, game, amount).await?;
        info!(uid = %uid, game = %game, amount, "Coins added");
        Ok(())
    }

    /// One game's counter (0 when absent), or every counter when `game` is
    /// `None`. A missing record reads as no earnings.
    pub async fn get_earnings(
        &self,
        session: &Session,
        game: Option<&str>,
    ) -> Result<Earnings, AppError> {
        let earnings = self
            .store
            .get(session.uid())
            .await?
            .map(|record| record.games_earnings)
            .unwrap_or_default();

        Ok(match game {
            Some(game) => Earnings::Game(earnings.get(game).copied().unwrap_or(0)),
            None => Earnings::All(earnings),
        })
    }

    /// Sum across games. Read failures are logged and count as 0.
    pub async fn get_total_earnings(&self, session: &Session) -> u64 {
        match self.store.get(session.uid()).await {
            Ok(Some(record)) => record.total_earnings(),
            Ok(None) => 0,
            Err(e) => {
                warn!(uid = %session.uid(), error = %e, "Failed to load earnings");
                0
            }
        }
    }
}
