// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vault store for deterministic testing.
//!
//! `MemoryStore` implements `VaultStore` over a mutex-guarded map, with an
//! optional artificial latency so callers can exercise storage timeouts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use keeper_core::{
    HealthStatus, KeeperError, PASSWORD_HASH_LEN, SecretRecord, StoreLifecycle, VaultStore,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, [u8; PASSWORD_HASH_LEN]>,
    secrets: HashMap<(String, String), SecretRecord>,
}

/// A `VaultStore` held entirely in memory.
///
/// Constraint semantics match the SQLite store: logins and
/// `(login, keyword)` pairs are unique, and secrets require an account.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    latency_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency` before it touches the map.
    pub fn with_latency(latency: Duration) -> Self {
        let store = Self::new();
        store.set_latency(latency);
        store
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                Ordering::SeqCst,
            );
    }

    /// Number of stored secrets across all logins.
    pub async fn secret_count(&self) -> usize {
        self.state.lock().await.secrets.len()
    }

    /// Raw stored row, bypassing login checks.
    pub async fn raw_secret(&self, login: &str, keyword: &str) -> Option<SecretRecord> {
        self.state
            .lock()
            .await
            .secrets
            .get(&(login.to_string(), keyword.to_string()))
            .cloned()
    }

    async fn delay(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl StoreLifecycle for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        self.delay().await;
        Ok(HealthStatus::Healthy)
    }

    async fn close(&self) -> Result<(), KeeperError> {
        Ok(())
    }
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn create_account(
        &self,
        login: &str,
        password_hash: &[u8; PASSWORD_HASH_LEN],
    ) -> Result<(), KeeperError> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(login) {
            return Err(KeeperError::DuplicateLogin {
                login: login.to_string(),
            });
        }
        state.accounts.insert(login.to_string(), *password_hash);
        Ok(())
    }

    async fn fetch_password_hash(
        &self,
        login: &str,
    ) -> Result<[u8; PASSWORD_HASH_LEN], KeeperError> {
        self.delay().await;
        self.state
            .lock()
            .await
            .accounts
            .get(login)
            .copied()
            .ok_or_else(|| KeeperError::AccountNotFound {
                login: login.to_string(),
            })
    }

    async fn insert_secret(&self, record: &SecretRecord) -> Result<(), KeeperError> {
        self.delay().await;
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&record.login) {
            return Err(KeeperError::UnknownAccount {
                login: record.login.clone(),
            });
        }
        let key = (record.login.clone(), record.keyword.clone());
        if state.secrets.contains_key(&key) {
            return Err(KeeperError::DuplicateKeyword {
                keyword: record.keyword.clone(),
            });
        }
        state.secrets.insert(key, record.clone());
        Ok(())
    }

    async fn fetch_secrets(
        &self,
        login: &str,
        keyword: &str,
    ) -> Result<Vec<SecretRecord>, KeeperError> {
        self.delay().await;
        self.state
            .lock()
            .await
            .secrets
            .get(&(login.to_string(), keyword.to_string()))
            .map(|record| vec![record.clone()])
            .ok_or_else(|| KeeperError::NoMatch {
                keyword: keyword.to_string(),
            })
    }

    async fn update_secret(&self, record: &SecretRecord) -> Result<(), KeeperError> {
        self.delay().await;
        let mut state = self.state.lock().await;
        let key = (record.login.clone(), record.keyword.clone());
        let stored = state
            .secrets
            .get_mut(&key)
            .ok_or_else(|| KeeperError::NoMatch {
                keyword: record.keyword.clone(),
            })?;
        stored.cipher_payload = record.cipher_payload.clone();
        stored.metadata = record.metadata.clone();
        Ok(())
    }

    async fn delete_secret(&self, login: &str, keyword: &str) -> Result<(), KeeperError> {
        self.delay().await;
        self.state
            .lock()
            .await
            .secrets
            .remove(&(login.to_string(), keyword.to_string()))
            .map(|_| ())
            .ok_or_else(|| KeeperError::NoMatch {
                keyword: keyword.to_string(),
            })
    }
}
