// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error type shared by every flow.

use crate::auth::{AuthFailure, AuthOperation, ProviderError};
use crate::blockchain::ChainError;
use crate::bonus::BonusError;
use crate::config::ConfigError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{} failed: {failure}", .operation.label())]
    Auth {
        failure: AuthFailure,
        operation: AuthOperation,
    },

    #[error("No user record for {uid}")]
    RecordNotFound { uid: String },

    #[error("Email is required")]
    MissingEmail,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("Recipient is the sender's own wallet")]
    SelfTransfer,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient balance: {balance} {symbol}")]
    InsufficientBalance { balance: String, symbol: String },

    #[error(transparent)]
    Bonus(#[from] BonusError),

    #[error(transparent)]
    Chain(ChainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("A wallet is already provisioned for {uid}")]
    AlreadyProvisioned { uid: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Key export failed: {0}")]
    Export(#[source] std::io::Error),
}

impl AppError {
    pub fn auth(operation: AuthOperation, err: ProviderError) -> Self {
        AppError::Auth {
            failure: err.into(),
            operation,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth { failure, operation } => failure.user_message(*operation),
            AppError::RecordNotFound { .. } => {
                "User data not found. Please contact support.".to_string()
            }
            AppError::MissingEmail => "Please enter your email address first.".to_string(),
            AppError::MissingCredentials => {
                "Please enter your email and password first.".to_string()
            }
            AppError::InvalidAddress(_) => "Invalid recipient address.".to_string(),
            AppError::SelfTransfer => "You can't send tokens to your own wallet.".to_string(),
            AppError::InvalidAmount(reason) => format!("Invalid amount: {reason}"),
            AppError::InsufficientBalance { balance, symbol } => {
                format!("Not enough {symbol} tokens. You only have {balance} {symbol}.")
            }
            AppError::Chain(e) => format!("Failed: {e}"),
            AppError::AlreadyProvisioned { .. } => {
                "This account already has a wallet.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(reason) => AppError::InvalidAddress(reason),
            ChainError::InvalidAmount(reason) => AppError::InvalidAmount(reason),
            ChainError::KeyGeneration(reason) => AppError::KeyGeneration(reason),
            other => AppError::Chain(other),
        }
    }
}
