// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{bump_counter, StorageError, StorageResult, UserStore};
use crate::models::{UserRecord, UserUpdate};

/// Process-local store. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    records: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, uid: &str) -> StorageResult<Option<UserRecord>> {
        Ok(self.records.read().await.get(uid).cloned())
    }

    async fn create(&self, uid: &str, record: &UserRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(uid) {
            return Err(StorageError::AlreadyExists(format!("User {uid}")));
        }
        records.insert(uid.to_string(), record.clone());
        Ok(())
    }

    async fn update(&self, uid: &str, updates: &[UserUpdate]) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(uid)
            .ok_or_else(|| StorageError::NotFound(format!("User {uid}")))?;

        let now = Utc::now();
        for update in updates {
            record.apply(update, now);
        }
        Ok(())
    }

    async fn increment_earnings(&self, uid: &str, game: &str, delta: u64) -> StorageResult<()> {
        // Write lock held across read-modify-write
        let mut records = self.records.write().await;
        let record = records
            .get_mut(uid)
            .ok_or_else(|| StorageError::NotFound(format!("User {uid}")))?;
        bump_counter(record, game, delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_record;

    #[tokio::test]
    async fn create_never_overwrites() {
        let store = MemoryUserStore::new();
        let first = sample_record("0x1111111111111111111111111111111111111111");
        store.create("u1", &first).await.unwrap();

        let second = sample_record("0x2222222222222222222222222222222222222222");
        let err = store.create("u1", &second).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let stored = store.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.wallet_address, first.wallet_address);
    }

    #[tokio::test]
    async fn update_missing_record_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store
            .update("ghost", &[UserUpdate::BonusGiven(true)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_increments_do_not_lose_updates() {
        let store = MemoryUserStore::new();
        store
            .create("u1", &sample_record("0x1111111111111111111111111111111111111111"))
            .await
            .unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.increment_earnings("u1", "dice", 5).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.increment_earnings("u1", "dice", 5).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let record = store.get("u1").await.unwrap().unwrap();
        assert_eq!(record.games_earnings.get("dice"), Some(&10));
    }
}
