// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provisioning for a newly authenticated identity.
//!
//! Produces exactly one [`UserRecord`] with a fresh wallet. The existence
//! check and the store's conditional create together guarantee a second run
//! never touches the stored wallet.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{AuthProvider, ProvisionedWallet, UserRecord};
use crate::state::AppState;
use crate::storage::StorageError;

/// The identity a wallet is provisioned for.
#[derive(Debug, Clone)]
pub struct NewIdentity<'a> {
    pub uid: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub photo_url: Option<&'a str>,
    pub auth_provider: AuthProvider,
    /// Provider-reported flag; ignored (forced true) for OAuth identities
    pub email_verified: bool,
}

/// Generate a wallet and persist the user's record.
///
/// # Returns
/// * `Ok(ProvisionedWallet)` - The only copy of the private key handed out
/// * `Err(AppError::AlreadyProvisioned)` - A record exists; nothing changed
/// * `Err(AppError::KeyGeneration)` - Key pair could not be created
/// * `Err(AppError::Storage)` - Record could not be read or written
pub async fn provision_user(
    state: &AppState,
    identity: &NewIdentity<'_>,
) -> Result<ProvisionedWallet, AppError> {
    let uid = identity.uid;

    if state.store.exists(uid).await? {
        warn!(uid = %uid, "Provisioning skipped, record already exists");
        return Err(AppError::AlreadyProvisioned { uid: uid.to_string() });
    }

    let wallet = state.wallets.generate()?;

    let record = UserRecord {
        email: identity.email.to_string(),
        username: identity.username.to_string(),
        wallet_address: wallet.address.clone(),
        private_key: wallet.private_key.clone(),
        bonus_given: false,
        created_at: Utc::now(),
        last_check_in: None,
        last_login: None,
        email_verified: identity.email_verified
            || identity.auth_provider == AuthProvider::Google,
        auth_provider: identity.auth_provider,
        photo_url: identity.photo_url.map(str::to_string),
        games_earnings: Default::default(),
    };

    match state.store.create(uid, &record).await {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => {
            warn!(uid = %uid, "Record appeared during provisioning, keeping existing wallet");
            return Err(AppError::AlreadyProvisioned { uid: uid.to_string() });
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        uid = %uid,
        wallet = %wallet.address,
        provider = %identity.auth_provider,
        "Wallet provisioned"
    );

    Ok(ProvisionedWallet {
        username: record.username,
        wallet_address: wallet.address,
        private_key: wallet.private_key,
    })
}
