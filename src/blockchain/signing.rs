// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signer construction from stored private keys.
//!
//! User records hold the key as `0x`-prefixed hex (the format produced by
//! [`super::wallet::generate_wallet`]); the prefix is optional on input.

use alloy::signers::local::PrivateKeySigner;

use super::client::ChainError;

/// Create a signer from a hex private key (with or without `0x`).
///
/// # Returns
/// * `Ok(PrivateKeySigner)` - A signer ready to sign transactions
/// * `Err(ChainError::InvalidPrivateKey)` - Not 32 bytes of hex, or not a
///   valid secp256k1 scalar
pub fn signer_from_hex(private_key: &str) -> Result<PrivateKeySigner, ChainError> {
    let trimmed = private_key.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    let key_bytes = alloy::hex::decode(hex)
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;

    if key_bytes.len() != 32 {
        return Err(ChainError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            key_bytes.len()
        )));
    }

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}
