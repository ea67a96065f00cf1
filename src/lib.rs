// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! S2 Rewards Client - Accounts, Wallets and Token Transfers
//!
//! Client-side orchestration for the S2 rewards app: every new account gets a
//! freshly generated EVM wallet, the first verified login triggers a one-time
//! welcome bonus, and signed-in users can transfer S2 tokens and track
//! per-game coin earnings.
//!
//! ## Modules
//!
//! - `auth` - Identity provider seam and auth error classification
//! - `flows` - Sign-up, login, provisioning and transfer flows
//! - `bonus` - One-time welcome bonus task
//! - `earnings` / `cooldown` - Game helpers
//! - `blockchain` - Wallet generation and ERC-20 ledger (alloy)
//! - `providers` - Firebase Auth, Firestore and bonus HTTP adapters
//! - `storage` - User store backends and local key/value state

pub mod auth;
pub mod blockchain;
pub mod bonus;
pub mod config;
pub mod cooldown;
pub mod earnings;
pub mod error;
pub mod export;
pub mod flows;
pub mod logging;
pub mod models;
pub mod providers;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;
