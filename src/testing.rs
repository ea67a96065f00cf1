// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the external collaborators.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use crate::auth::{
    IdentityProvider, IdentityUser, OAuthCredential, ProfileUpdate, ProviderError, Session,
};
use crate::blockchain::{
    ChainError, GeneratedWallet, LedgerFactory, TokenConfig, TokenLedger, TxReceipt,
    WalletGenerator,
};
use crate::bonus::{BonusError, BonusService};
use crate::models::{AuthProvider, UserRecord, UserUpdate};
use crate::state::AppState;
use crate::storage::{MemoryUserStore, StorageError, StorageResult, UserStore};

/// First Hardhat/Anvil development account.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub fn sample_record(wallet_address: &str) -> UserRecord {
    UserRecord {
        email: "tester@example.com".into(),
        username: "tester".into(),
        wallet_address: wallet_address.into(),
        private_key: format!("0x{}", "ab".repeat(32)),
        bonus_given: false,
        created_at: Utc::now(),
        last_check_in: None,
        last_login: None,
        email_verified: true,
        auth_provider: AuthProvider::Email,
        photo_url: None,
        games_earnings: BTreeMap::new(),
    }
}

// =============================================================================
// Identity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityOp {
    CreateAccount,
    SignIn,
    OAuth,
    SendVerification,
    SendReset,
    Reload,
    UpdateProfile,
}

#[derive(Debug, Clone)]
struct Account {
    user: IdentityUser,
    password: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: Vec<Account>,
    google_tokens: HashMap<String, String>,
    failures: HashMap<IdentityOp, ProviderError>,
    sign_outs: usize,
    verification_emails: Vec<String>,
    reset_emails: Vec<String>,
    profile_updates: Vec<(String, Option<String>)>,
}

/// Scriptable identity provider.
#[derive(Default)]
pub struct FakeIdentity {
    state: Mutex<IdentityState>,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an email/password account; returns its uid.
    pub fn add_account(&self, email: &str, password: &str, email_verified: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let uid = format!("uid-{}", state.accounts.len() + 1);
        state.accounts.push(Account {
            user: IdentityUser {
                uid: uid.clone(),
                email: email.into(),
                email_verified,
                display_name: None,
                photo_url: None,
            },
            password: password.into(),
        });
        uid
    }

    /// Register a Google identity reachable with `id_token`; returns its uid.
    pub fn add_google(&self, id_token: &str, email: &str, display_name: &str) -> String {
        let uid = self.add_account(email, "", true);
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.iter_mut().find(|a| a.user.uid == uid) {
            account.user.display_name = Some(display_name.into());
            account.user.photo_url = Some("https://example.com/photo.png".into());
        }
        state.google_tokens.insert(id_token.into(), uid.clone());
        uid
    }

    pub fn fail(&self, op: IdentityOp, code: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, ProviderError::new(code, format!("{op:?} failed")));
    }

    pub fn sign_outs(&self) -> usize {
        self.state.lock().unwrap().sign_outs
    }

    pub fn verification_emails(&self) -> Vec<String> {
        self.state.lock().unwrap().verification_emails.clone()
    }

    pub fn reset_emails(&self) -> Vec<String> {
        self.state.lock().unwrap().reset_emails.clone()
    }

    pub fn display_name_updates(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().profile_updates.clone()
    }

    fn check(&self, op: IdentityOp) -> Result<(), ProviderError> {
        match self.state.lock().unwrap().failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn session(user: IdentityUser) -> Session {
        Session {
            id_token: format!("id-{}", user.uid),
            refresh_token: format!("refresh-{}", user.uid),
            user,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.check(IdentityOp::CreateAccount)?;
        if self.state.lock().unwrap().accounts.iter().any(|a| a.user.email == email) {
            return Err(ProviderError::new("auth/email-already-in-use", "EMAIL_EXISTS"));
        }
        if password.len() < 6 {
            return Err(ProviderError::new("auth/weak-password", "WEAK_PASSWORD"));
        }
        let uid = self.add_account(email, password, false);
        let user = self
            .state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.user.uid == uid)
            .map(|a| a.user.clone())
            .unwrap();
        Ok(Self::session(user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        self.check(IdentityOp::SignIn)?;
        let state = self.state.lock().unwrap();
        let account = state
            .accounts
            .iter()
            .find(|a| a.user.email == email)
            .ok_or_else(|| ProviderError::new("auth/user-not-found", "EMAIL_NOT_FOUND"))?;
        if account.password != password {
            return Err(ProviderError::new(
                "auth/invalid-credential",
                "INVALID_LOGIN_CREDENTIALS",
            ));
        }
        Ok(Self::session(account.user.clone()))
    }

    async fn sign_in_with_oauth(
        &self,
        credential: &OAuthCredential,
    ) -> Result<Session, ProviderError> {
        self.check(IdentityOp::OAuth)?;
        let OAuthCredential::Google { id_token } = credential;
        let state = self.state.lock().unwrap();
        let uid = state
            .google_tokens
            .get(id_token)
            .ok_or_else(|| ProviderError::new("auth/invalid-credential", "INVALID_IDP_RESPONSE"))?;
        let account = state.accounts.iter().find(|a| &a.user.uid == uid).unwrap();
        Ok(Self::session(account.user.clone()))
    }

    async fn send_verification_email(&self, session: &Session) -> Result<(), ProviderError> {
        self.check(IdentityOp::SendVerification)?;
        self.state
            .lock()
            .unwrap()
            .verification_emails
            .push(session.email().to_string());
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        self.check(IdentityOp::SendReset)?;
        self.state.lock().unwrap().reset_emails.push(email.to_string());
        Ok(())
    }

    async fn reload(&self, session: &Session) -> Result<IdentityUser, ProviderError> {
        self.check(IdentityOp::Reload)?;
        self.state
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.user.uid == session.uid())
            .map(|a| a.user.clone())
            .ok_or_else(|| ProviderError::new("auth/user-not-found", "USER_NOT_FOUND"))
    }

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        self.check(IdentityOp::UpdateProfile)?;
        let mut state = self.state.lock().unwrap();
        state
            .profile_updates
            .push((session.uid().to_string(), update.display_name.clone()));
        if let Some(account) = state.accounts.iter_mut().find(|a| a.user.uid == session.uid()) {
            if let Some(name) = &update.display_name {
                account.user.display_name = Some(name.clone());
            }
        }
        Ok(())
    }

    async fn sign_out(&self, _session: Session) -> Result<(), ProviderError> {
        self.state.lock().unwrap().sign_outs += 1;
        Ok(())
    }
}

/// A signed-in session for `uid` without going through a provider.
pub fn session_for(uid: &str) -> Session {
    Session {
        user: IdentityUser {
            uid: uid.into(),
            email: "tester@example.com".into(),
            email_verified: true,
            ..Default::default()
        },
        id_token: format!("id-{uid}"),
        refresh_token: format!("refresh-{uid}"),
    }
}

// =============================================================================
// Store
// =============================================================================

/// Memory store that counts calls and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryUserStore,
    gets: AtomicUsize,
    creates: AtomicUsize,
    fail_create: AtomicBool,
    fail_get: AtomicBool,
    updates: Mutex<Vec<(String, Vec<UserUpdate>)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(String, Vec<UserUpdate>)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_gets(&self) {
        self.fail_get.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for RecordingStore {
    async fn get(&self, uid: &str) -> StorageResult<Option<UserRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StorageError::Remote("unavailable".into()));
        }
        self.inner.get(uid).await
    }

    async fn create(&self, uid: &str, record: &UserRecord) -> StorageResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StorageError::Remote("permission denied".into()));
        }
        self.inner.create(uid, record).await
    }

    async fn update(&self, uid: &str, updates: &[UserUpdate]) -> StorageResult<()> {
        self.updates
            .lock()
            .unwrap()
            .push((uid.to_string(), updates.to_vec()));
        self.inner.update(uid, updates).await
    }

    async fn increment_earnings(&self, uid: &str, game: &str, delta: u64) -> StorageResult<()> {
        self.inner.increment_earnings(uid, game, delta).await
    }
}

// =============================================================================
// Wallets
// =============================================================================

/// Hands out the development key, or fails.
pub struct FixedWalletGenerator {
    fail: bool,
    calls: AtomicUsize,
}

impl FixedWalletGenerator {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WalletGenerator for FixedWalletGenerator {
    fn generate(&self) -> Result<GeneratedWallet, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ChainError::KeyGeneration("entropy unavailable".into()));
        }
        Ok(GeneratedWallet {
            address: DEV_ADDRESS.into(),
            private_key: DEV_KEY.into(),
        })
    }
}

// =============================================================================
// Bonus
// =============================================================================

pub struct FakeBonus {
    result: Result<(), BonusError>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
}

impl FakeBonus {
    pub fn succeeding() -> Self {
        Self {
            result: Ok(()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: BonusError) -> Self {
        Self {
            result: Err(err),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds only after the returned notifier fires.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let bonus = Self {
            result: Ok(()),
            gate: Some(gate.clone()),
            calls: Mutex::new(Vec::new()),
        };
        (bonus, gate)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BonusService for FakeBonus {
    async fn disburse(&self, wallet_address: &str) -> Result<(), BonusError> {
        self.calls.lock().unwrap().push(wallet_address.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Call names recorded by [`FakeLedger`].
pub const CALL_DECIMALS: &str = "decimals";
pub const CALL_BALANCE: &str = "balance_of";
pub const CALL_SUBMIT: &str = "submit_transfer";
pub const CALL_CONFIRM: &str = "wait_for_confirmation";

pub struct FakeLedger {
    sender: Address,
    decimals: u8,
    balance: U256,
    reverted: bool,
    submit_error: Option<String>,
    calls: Mutex<Vec<&'static str>>,
    submitted: Mutex<Vec<(Address, U256)>>,
}

impl FakeLedger {
    /// 18-decimal token; `balance` in whole tokens.
    pub fn new(sender: Address, balance: u64) -> Self {
        Self {
            sender,
            decimals: 18,
            balance: U256::from(balance) * U256::from(10u64).pow(U256::from(18u64)),
            reverted: false,
            submit_error: None,
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn reverting(mut self) -> Self {
        self.reverted = true;
        self
    }

    pub fn rejecting(mut self, message: &str) -> Self {
        self.submit_error = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<(Address, U256)> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn fake_tx_hash() -> TxHash {
    TxHash::repeat_byte(0x42)
}

#[async_trait]
impl TokenLedger for FakeLedger {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn decimals(&self) -> Result<u8, ChainError> {
        self.record(CALL_DECIMALS);
        Ok(self.decimals)
    }

    async fn balance_of(&self, _owner: Address) -> Result<U256, ChainError> {
        self.record(CALL_BALANCE);
        Ok(self.balance)
    }

    async fn submit_transfer(&self, to: Address, amount: U256) -> Result<TxHash, ChainError> {
        self.record(CALL_SUBMIT);
        if let Some(message) = &self.submit_error {
            return Err(ChainError::TransactionFailed(message.clone()));
        }
        self.submitted.lock().unwrap().push((to, amount));
        Ok(fake_tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        self.record(CALL_CONFIRM);
        Ok(TxReceipt {
            tx_hash,
            block_number: 7,
            gas_used: 51_000,
            success: !self.reverted,
        })
    }
}

/// Always returns the same [`FakeLedger`]; remembers the keys it was given.
pub struct FakeLedgerFactory {
    pub ledger: Arc<FakeLedger>,
    keys: Mutex<HashSet<String>>,
}

impl FakeLedgerFactory {
    pub fn new(ledger: FakeLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            keys: Mutex::new(HashSet::new()),
        }
    }

    pub fn keys(&self) -> HashSet<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl LedgerFactory for FakeLedgerFactory {
    fn connect(&self, private_key: &str) -> Result<Arc<dyn TokenLedger>, ChainError> {
        self.keys.lock().unwrap().insert(private_key.to_string());
        Ok(self.ledger.clone())
    }
}

// =============================================================================
// State
// =============================================================================

/// Concrete handles to every fake behind an [`AppState`].
pub struct Harness {
    pub identity: Arc<FakeIdentity>,
    pub store: Arc<RecordingStore>,
    pub wallets: Arc<FixedWalletGenerator>,
    pub bonus: Arc<FakeBonus>,
    pub ledgers: Arc<FakeLedgerFactory>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_bonus(FakeBonus::succeeding())
    }

    pub fn with_bonus(bonus: FakeBonus) -> Self {
        let sender = DEV_ADDRESS.parse().unwrap();
        Self {
            identity: Arc::new(FakeIdentity::new()),
            store: Arc::new(RecordingStore::new()),
            wallets: Arc::new(FixedWalletGenerator::new()),
            bonus: Arc::new(bonus),
            ledgers: Arc::new(FakeLedgerFactory::new(FakeLedger::new(sender, 100))),
        }
    }

    pub fn with_ledger(mut self, ledger: FakeLedger) -> Self {
        self.ledgers = Arc::new(FakeLedgerFactory::new(ledger));
        self
    }

    pub fn with_wallets(mut self, wallets: FixedWalletGenerator) -> Self {
        self.wallets = Arc::new(wallets);
        self
    }

    pub fn state(&self) -> AppState {
        AppState {
            identity: self.identity.clone(),
            store: self.store.clone(),
            wallets: self.wallets.clone(),
            bonus: self.bonus.clone(),
            ledgers: self.ledgers.clone(),
            token: TokenConfig::default(),
        }
    }

    /// Put a record for `uid` straight into the store.
    pub async fn seed_record(&self, uid: &str, record: UserRecord) {
        self.store.inner.create(uid, &record).await.unwrap();
    }

    pub async fn record(&self, uid: &str) -> Option<UserRecord> {
        self.store.inner.get(uid).await.unwrap()
    }
}
