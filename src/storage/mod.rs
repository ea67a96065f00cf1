// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Document Storage
//!
//! One [`UserRecord`] per identity, keyed by the provider's user id, behind
//! the [`UserStore`] trait.
//!
//! ## Backends
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | Firestore (hosted) | [`crate::providers::firestore`] | production |
//! | redb file | [`user_db`] | offline / single-machine |
//! | in-memory | [`memory`] | tests, demos |
//!
//! ## Guarantees every backend provides
//!
//! - `create` is create-if-absent: an existing record is never overwritten
//! - `update` merges fields; timestamp sentinels use the store's clock
//! - `increment_earnings` is atomic: concurrent increments never lose updates
//!
//! Client-local key/value state (cooldowns) lives in [`local`].

pub mod local;
pub mod memory;
pub mod user_db;

use async_trait::async_trait;

use crate::models::{UserRecord, UserUpdate};

pub use local::{JsonFileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use memory::MemoryUserStore;
pub use user_db::RedbUserStore;

/// Collection name used by document-oriented backends.
pub const USERS_COLLECTION: &str = "users";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Counter overflow: {0}")]
    Overflow(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Per-user document store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch the record for `uid`, `None` when absent.
    async fn get(&self, uid: &str) -> StorageResult<Option<UserRecord>>;

    /// Persist a new record. Fails with [`StorageError::AlreadyExists`]
    /// instead of overwriting.
    async fn create(&self, uid: &str, record: &UserRecord) -> StorageResult<()>;

    /// Merge field updates into an existing record.
    async fn update(&self, uid: &str, updates: &[UserUpdate]) -> StorageResult<()>;

    /// Atomically add `delta` to `gamesEarnings[game]` (missing counter = 0).
    async fn increment_earnings(&self, uid: &str, game: &str, delta: u64) -> StorageResult<()>;

    async fn exists(&self, uid: &str) -> StorageResult<bool> {
        Ok(self.get(uid).await?.is_some())
    }
}

/// Add `delta` to one counter, refusing to wrap.
pub(crate) fn bump_counter(record: &mut UserRecord, game: &str, delta: u64) -> StorageResult<()> {
    let counter = record.games_earnings.entry(game.to_string()).or_insert(0);
    *counter = counter
        .checked_add(delta)
        .ok_or_else(|| StorageError::Overflow(format!("gamesEarnings.{game}")))?;
    Ok(())
}
