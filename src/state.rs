// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::blockchain::{LedgerFactory, TokenConfig, WalletGenerator};
use crate::bonus::BonusService;
use crate::storage::UserStore;

/// External collaborators shared by every flow.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn UserStore>,
    pub wallets: Arc<dyn WalletGenerator>,
    pub bonus: Arc<dyn BonusService>,
    pub ledgers: Arc<dyn LedgerFactory>,
    pub token: TokenConfig,
}
