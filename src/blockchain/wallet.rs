// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet key generation and address validation.

use std::str::FromStr;

use alloy::primitives::{keccak256, Address};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::rand_core::OsRng;

use super::client::ChainError;

/// A freshly generated key pair.
#[derive(Clone)]
pub struct GeneratedWallet {
    /// EIP-55 checksummed address
    pub address: String,
    /// `0x` + 64 hex characters
    pub private_key: String,
}

impl std::fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Source of new wallets.
pub trait WalletGenerator: Send + Sync {
    fn generate(&self) -> Result<GeneratedWallet, ChainError>;
}

/// Generates random secp256k1 keys from the OS RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalletGenerator;

impl WalletGenerator for RandomWalletGenerator {
    fn generate(&self) -> Result<GeneratedWallet, ChainError> {
        generate_wallet()
    }
}

/// Generate a random secp256k1 key pair and derive its Ethereum address.
pub fn generate_wallet() -> Result<GeneratedWallet, ChainError> {
    // Generate random signing key (secp256k1)
    let signing_key = SigningKey::random(&mut OsRng);
    let private_key = format!("0x{}", alloy::hex::encode(signing_key.to_bytes()));

    // Uncompressed public key: 0x04 prefix + 64 bytes of x,y coordinates
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    let public_key_bytes = public_key.as_bytes();
    if public_key_bytes.len() != 65 {
        return Err(ChainError::KeyGeneration(format!(
            "unexpected public key length {}",
            public_key_bytes.len()
        )));
    }

    // Address is the last 20 bytes of keccak256(x || y)
    let hash = keccak256(&public_key_bytes[1..]);
    let address = Address::from_slice(&hash[12..]);

    Ok(GeneratedWallet {
        address: address.to_checksum(None),
        private_key,
    })
}

/// Parse and validate an account address.
///
/// Accepts 40 hex digits with an optional `0x` prefix. All-lowercase and
/// all-uppercase inputs are accepted as-is; mixed case must carry a valid
/// EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address, ChainError> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChainError::InvalidAddress(format!(
            "\"{trimmed}\" is not a 20-byte hex address"
        )));
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{hex}"), None)
            .map_err(|_| ChainError::InvalidAddress(format!("bad checksum: {trimmed}")));
    }

    Address::from_str(hex).map_err(|e| ChainError::InvalidAddress(e.to_string()))
}

/// Whether `input` is a valid account address.
pub fn is_address(input: &str) -> bool {
    parse_address(input).is_ok()
}
