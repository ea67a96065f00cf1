// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC provider construction and chain errors.

use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{DynProvider, Provider, ProviderBuilder},
};

use super::types::NetworkConfig;

/// Build an HTTP provider, with a signing wallet when one is given.
pub fn connect_http(
    network: &NetworkConfig,
    wallet: Option<EthereumWallet>,
) -> Result<DynProvider<Ethereum>, ChainError> {
    let url: url::Url = network
        .rpc_url
        .parse()
        .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

    let provider = match wallet {
        Some(wallet) => ProviderBuilder::new().wallet(wallet).connect_http(url).erased(),
        None => ProviderBuilder::new().connect_http(url).erased(),
    };
    Ok(provider)
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
