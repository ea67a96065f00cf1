// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: uid → serialized UserRecord (JSON bytes)
//!
//! Every mutation runs inside a single write transaction. redb allows one
//! writer at a time, which makes the earnings increment atomic.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{bump_counter, StorageError, StorageResult, UserStore};
use crate::models::{UserRecord, UserUpdate};

/// Primary table: uid → serialized UserRecord (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// redb-backed [`UserStore`]. Cloning shares the open database.
#[derive(Clone)]
pub struct RedbUserStore {
    db: Arc<Database>,
}

impl RedbUserStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Read-modify-write one record inside a write transaction.
    fn modify<F>(&self, uid: &str, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut UserRecord) -> StorageResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table
                    .get(uid)?
                    .ok_or_else(|| StorageError::NotFound(format!("User {uid}")))?;
                existing.value().to_vec()
            };

            let mut record: UserRecord = serde_json::from_slice(&existing_bytes)?;
            mutate(&mut record)?;

            let json = serde_json::to_vec(&record)?;
            table.insert(uid, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for RedbUserStore {
    async fn get(&self, uid: &str) -> StorageResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(uid)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn create(&self, uid: &str, record: &UserRecord) -> StorageResult<()> {
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            if table.get(uid)?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User {uid}")));
            }
            table.insert(uid, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn update(&self, uid: &str, updates: &[UserUpdate]) -> StorageResult<()> {
        let now = Utc::now();
        self.modify(uid, |record| {
            for update in updates {
                record.apply(update, now);
            }
            Ok(())
        })
    }

    async fn increment_earnings(&self, uid: &str, game: &str, delta: u64) -> StorageResult<()> {
        self.modify(uid, |record| bump_counter(record, game, delta))
    }
}
