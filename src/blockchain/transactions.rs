// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token transfer submission and confirmation.
//!
//! [`TokenLedger`] is the seam the transfer flow talks to: contract reads,
//! `transfer` submission and confirmation. [`Erc20Ledger`] implements it with
//! alloy against a JSON-RPC endpoint, signing with the user's key.

use std::sync::Arc;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider},
};
use async_trait::async_trait;

use super::client::{connect_http, ChainError};
use super::erc20::Erc20Contract;
use super::signing::signer_from_hex;
use super::types::{NetworkConfig, TokenConfig};

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// Token contract operations for one sender.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Address that signs transfers.
    fn sender(&self) -> Address;

    async fn decimals(&self) -> Result<u8, ChainError>;

    async fn balance_of(&self, owner: Address) -> Result<U256, ChainError>;

    /// Broadcast a transfer; returns as soon as the node accepts it.
    async fn submit_transfer(&self, to: Address, amount: U256) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError>;
}

/// Builds a [`TokenLedger`] for a user's stored private key.
pub trait LedgerFactory: Send + Sync {
    fn connect(&self, private_key: &str) -> Result<Arc<dyn TokenLedger>, ChainError>;
}

/// ERC-20 ledger over an alloy HTTP provider with a local signer.
pub struct Erc20Ledger {
    sender: Address,
    provider: DynProvider<Ethereum>,
    contract: Erc20Contract<DynProvider<Ethereum>>,
}

impl Erc20Ledger {
    pub fn new(
        network: &NetworkConfig,
        token: &TokenConfig,
        private_key: &str,
    ) -> Result<Self, ChainError> {
        let signer = signer_from_hex(private_key)?;
        let sender = signer.address();
        let provider = connect_http(network, Some(EthereumWallet::from(signer)))?;
        let contract = Erc20Contract::new(&provider, &token.address)?;

        Ok(Self {
            sender,
            provider,
            contract,
        })
    }
}

#[async_trait]
impl TokenLedger for Erc20Ledger {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn decimals(&self) -> Result<u8, ChainError> {
        self.contract.decimals().await
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ChainError> {
        self.contract.balance_of(owner).await
    }

    async fn submit_transfer(&self, to: Address, amount: U256) -> Result<TxHash, ChainError> {
        self.contract.transfer(to, amount).await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await
            .map_err(|e| ChainError::TransactionFailed(e.to_string()))?;

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number.unwrap_or(0),
            gas_used: receipt.gas_used,
            success: receipt.status(),
        })
    }
}

/// [`LedgerFactory`] producing [`Erc20Ledger`]s for one network and token.
#[derive(Debug, Clone)]
pub struct Erc20LedgerFactory {
    network: NetworkConfig,
    token: TokenConfig,
}

impl Erc20LedgerFactory {
    pub fn new(network: NetworkConfig, token: TokenConfig) -> Self {
        Self { network, token }
    }
}

impl LedgerFactory for Erc20LedgerFactory {
    fn connect(&self, private_key: &str) -> Result<Arc<dyn TokenLedger>, ChainError> {
        Ok(Arc::new(Erc20Ledger::new(
            &self.network,
            &self.token,
            private_key,
        )?))
    }
}

/// Parse a human-readable amount to the token's smallest unit.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals reported by the contract
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit
/// * `Err` - Empty, signed, non-numeric, over-precise or overflowing input
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainError> {
    let amount = amount.trim();
    let multiplier = unit_scale(decimals).ok_or_else(|| {
        ChainError::InvalidAmount(format!("Unsupported token decimals {decimals}"))
    })?;
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(ChainError::InvalidAmount(format!(
            "\"{amount}\" is not a number"
        )));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ChainError::InvalidAmount(format!(
            "\"{amount}\" is not a number"
        )));
    }
    if fraction.len() > decimals as usize {
        return Err(ChainError::InvalidAmount(format!(
            "Too many decimal places (max {decimals})"
        )));
    }

    let overflow = || ChainError::InvalidAmount("Amount overflow".to_string());

    let whole_units = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| overflow())?
    };

    // Pad with zeros to match decimals
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction_units = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10).map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// `10^decimals`, or `None` when it does not fit in a U256.
fn unit_scale(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Format token units to a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    // Past 10^77 every U256 is below one whole token.
    let (whole, remainder) = match unit_scale(decimals) {
        Some(divisor) => (amount / divisor, amount % divisor),
        None => (U256::ZERO, amount),
    };

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}
