// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module (EVM / ERC-20).
//!
//! This module provides functionality for:
//! - Generating wallets and validating addresses
//! - Querying ERC-20 decimals and balances
//! - Signing, broadcasting and confirming token transfers

pub mod client;
pub mod erc20;
pub mod signing;
pub mod transactions;
pub mod types;
pub mod wallet;

pub use client::{connect_http, ChainError};
pub use signing::signer_from_hex;
pub use transactions::{
    format_amount, parse_amount, Erc20Ledger, Erc20LedgerFactory, LedgerFactory, TokenLedger,
    TxReceipt,
};
pub use types::*;
pub use wallet::{
    generate_wallet, is_address, parse_address, GeneratedWallet, RandomWalletGenerator,
    WalletGenerator,
};
