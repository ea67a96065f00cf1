// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # One-time Welcome Bonus
//!
//! The bonus is a best-effort side channel of login. [`spawn_bonus`] runs it
//! as an independent task so login latency never depends on the bonus
//! service; the returned [`BonusHandle`] can be awaited or dropped.
//!
//! `bonusGiven` is set only after the service reports success, so a failed
//! attempt is retried on the next login.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::UserUpdate;
use crate::storage::UserStore;

/// Errors from the bonus disbursement service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BonusError {
    /// Service answered with a non-success HTTP status
    #[error("Bonus service unavailable: {0}")]
    Unavailable(String),

    /// Service processed the request and refused it
    #[error("Bonus rejected: {0}")]
    Rejected(String),

    /// Service could not be reached
    #[error("Bonus service unreachable: {0}")]
    Network(String),

    #[error("Bonus service response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Bonus task failed: {0}")]
    Task(String),
}

/// External endpoint that sends the welcome bonus to a wallet.
#[async_trait]
pub trait BonusService: Send + Sync {
    async fn disburse(&self, wallet_address: &str) -> Result<(), BonusError>;
}

/// What happened to a bonus attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BonusOutcome {
    /// Tokens sent and `bonusGiven` recorded
    Granted,
    /// Tokens sent but the record update failed; the message is the storage error
    NotRecorded(String),
    /// Nothing was sent
    Failed(BonusError),
}

impl BonusOutcome {
    /// Notice shown to the user once the outcome is known.
    pub fn user_message(&self) -> String {
        match self {
            BonusOutcome::Granted | BonusOutcome::NotRecorded(_) => {
                "Welcome bonus S2 tokens have been sent to your wallet!".to_string()
            }
            BonusOutcome::Failed(BonusError::Rejected(_)) => {
                "Note: There was an issue sending your bonus tokens. Please contact support."
                    .to_string()
            }
            BonusOutcome::Failed(BonusError::Unavailable(_)) => {
                "Note: Bonus token service is currently unavailable.".to_string()
            }
            BonusOutcome::Failed(_) => {
                "Note: Unable to connect to bonus token service.".to_string()
            }
        }
    }
}

/// Handle to a running bonus task.
#[derive(Debug)]
pub struct BonusHandle {
    task: JoinHandle<BonusOutcome>,
}

impl BonusHandle {
    /// Wait for the bonus attempt to finish.
    pub async fn outcome(self) -> BonusOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => BonusOutcome::Failed(BonusError::Task(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Bonus state reported by a completed login.
#[derive(Debug)]
pub enum BonusStatus {
    /// `bonusGiven` was already true; nothing was attempted
    AlreadyGiven,
    /// An attempt is running in the background
    Pending(BonusHandle),
}

/// Disburse the bonus and record it, in a background task.
pub fn spawn_bonus(
    service: Arc<dyn BonusService>,
    store: Arc<dyn UserStore>,
    uid: String,
    wallet_address: String,
) -> BonusHandle {
    let task = tokio::spawn(async move { run_bonus(&*service, &*store, &uid, &wallet_address).await });
    BonusHandle { task }
}

async fn run_bonus(
    service: &dyn BonusService,
    store: &dyn UserStore,
    uid: &str,
    wallet_address: &str,
) -> BonusOutcome {
    info!(uid = %uid, wallet = %wallet_address, "Requesting welcome bonus");

    if let Err(e) = service.disburse(wallet_address).await {
        warn!(uid = %uid, error = %e, "Welcome bonus not sent");
        return BonusOutcome::Failed(e);
    }

    match store.update(uid, &[UserUpdate::BonusGiven(true)]).await {
        Ok(()) => {
            info!(uid = %uid, "Welcome bonus sent");
            BonusOutcome::Granted
        }
        Err(e) => {
            warn!(uid = %uid, error = %e, "Welcome bonus sent but bonusGiven not recorded");
            BonusOutcome::NotRecorded(e.to_string())
        }
    }
}
