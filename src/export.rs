// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Private key backup file written right after a wallet is provisioned.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AppError;
use crate::models::ProvisionedWallet;

/// Suffixed names tried after the short-address one before giving up.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Write `S2Wallet_{username}.txt` into `dir` and return its path.
///
/// The file holds the plaintext private key; it is the user's only backup,
/// so an existing file is never replaced. When the name is taken the short
/// wallet address is appended, then a counter.
pub fn export_private_key(
    dir: &Path,
    wallet: &ProvisionedWallet,
    email: &str,
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir).map_err(AppError::Export)?;

    let stem = export_file_stem(&wallet.username);
    let short = short_address(&wallet.wallet_address);
    let candidates = std::iter::once(format!("{stem}.txt"))
        .chain(std::iter::once(format!("{stem}_{short}.txt")))
        .chain((2..=MAX_NAME_ATTEMPTS).map(|n| format!("{stem}_{short}_{n}.txt")));

    let contents = render(wallet, email);
    let mut taken = None;
    for name in candidates {
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .and_then(|()| file.sync_all())
                    .map_err(AppError::Export)?;
                taken = Some(path);
                break;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(AppError::Export(e)),
        }
    }
    let path = taken.ok_or_else(|| {
        AppError::Export(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free backup file name for {stem}"),
        ))
    })?;

    info!(
        path = %path.display(),
        wallet = %wallet.wallet_address,
        "Private key exported"
    );
    Ok(path)
}

/// Terminal fallback shown when the backup file could not be written.
///
/// Contains the private key; print it, never log it.
pub fn key_backup_notice(wallet: &ProvisionedWallet) -> String {
    format!(
        "IMPORTANT: Save your private key!\n\
         Wallet Address: {}\n\
         Private Key: {}",
        wallet.wallet_address, wallet.private_key
    )
}

fn export_file_stem(username: &str) -> String {
    let safe: String = username
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = if safe.trim_matches('.').is_empty() {
        "user".to_string()
    } else {
        safe
    };
    format!("S2Wallet_{safe}")
}

/// First eight hex digits of the address, lowercased.
fn short_address(address: &str) -> String {
    let hex = address.strip_prefix("0x").unwrap_or(address);
    hex.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn render(wallet: &ProvisionedWallet, email: &str) -> String {
    format!(
        "S2 Wallet Private Key\n\
         =====================\n\
         Username: {}\n\
         Email: {}\n\
         Wallet Address: {}\n\
         Private Key: {}\n\
         \n\
         KEEP THIS SAFE!\n\
         - Never share this private key\n\
         - Store it securely\n\
         - You need it to access your wallet\n",
        wallet.username, email, wallet.wallet_address, wallet.private_key
    )
}
