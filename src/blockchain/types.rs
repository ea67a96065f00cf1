// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: String,
}

impl NetworkConfig {
    /// Ethereum Sepolia testnet with the given RPC endpoint.
    pub fn sepolia(rpc_url: impl Into<String>) -> Self {
        Self {
            name: "Ethereum Sepolia".to_string(),
            chain_id: 11_155_111,
            rpc_url: rpc_url.into(),
            explorer_url: SEPOLIA_EXPLORER_URL.to_string(),
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Public Sepolia RPC endpoint used when none is configured.
pub const SEPOLIA_DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Sepolia block explorer.
pub const SEPOLIA_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

/// ERC-20 token the app rewards and transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub symbol: String,
    /// Contract address
    pub address: String,
}

/// S2 reward token deployed on Sepolia.
pub const S2_TOKEN_SYMBOL: &str = "S2";
pub const S2_TOKEN_SEPOLIA_ADDRESS: &str = "0x56eaaf87a9f4b2cc413df472b23950b2a8db2fcc";

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            symbol: S2_TOKEN_SYMBOL.to_string(),
            address: S2_TOKEN_SEPOLIA_ADDRESS.to_string(),
        }
    }
}
