// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end vault tests.
//!
//! `TestHarness` assembles a [`VaultService`] over either a [`MemoryStore`]
//! or a SQLite file in a temp directory, and offers shortcuts for the usual
//! register-then-call flow.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use keeper_config::model::StorageConfig;
use keeper_core::{CallMetadata, KeeperError, VaultStore};
use keeper_service::{CREDENTIAL_METADATA_KEY, VaultService};
use keeper_storage::SqliteStore;

use crate::memory_store::MemoryStore;

/// Vault secret used by every harness unless overridden.
pub const TEST_SECRET: &str = "keeper-test-harness-secret-0123456789";

enum Backend {
    Memory,
    Sqlite,
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    backend: Backend,
    latency: Option<Duration>,
    storage_timeout: Duration,
    secret: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            backend: Backend::Memory,
            latency: None,
            storage_timeout: Duration::from_secs(5),
            secret: TEST_SECRET.to_string(),
        }
    }

    /// Back the service with a SQLite file instead of the in-memory store.
    pub fn with_sqlite(mut self) -> Self {
        self.backend = Backend::Sqlite;
        self
    }

    /// Delay every in-memory store operation.
    pub fn with_store_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Deadline applied to each storage call.
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    /// Build the test harness, creating the store and service.
    pub async fn build(self) -> Result<TestHarness, KeeperError> {
        let mut temp_dir = None;
        let mut memory = None;

        let store: Arc<dyn VaultStore> = match self.backend {
            Backend::Memory => {
                let store = Arc::new(MemoryStore::new());
                if let Some(latency) = self.latency {
                    store.set_latency(latency);
                }
                memory = Some(Arc::clone(&store));
                store
            }
            Backend::Sqlite => {
                let dir = tempfile::TempDir::new()
                    .map_err(|e| KeeperError::Storage { source: e.into() })?;
                let config = StorageConfig {
                    database_path: dir.path().join("vault.db").to_string_lossy().into_owned(),
                    ..StorageConfig::default()
                };
                let store = SqliteStore::open(&config).await?;
                temp_dir = Some(dir);
                Arc::new(store)
            }
        };

        let service = VaultService::new(
            store,
            SecretString::from(self.secret),
            self.storage_timeout,
        )?;

        Ok(TestHarness {
            service: Arc::new(service),
            memory,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully assembled vault for tests.
pub struct TestHarness {
    service: Arc<VaultService>,
    memory: Option<Arc<MemoryStore>>,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// In-memory harness with default settings.
    pub async fn new() -> Result<Self, KeeperError> {
        Self::builder().build().await
    }

    pub fn service(&self) -> &Arc<VaultService> {
        &self.service
    }

    /// The in-memory store, when the harness uses one.
    pub fn memory_store(&self) -> Option<&Arc<MemoryStore>> {
        self.memory.as_ref()
    }

    /// Register `login` and return call metadata carrying its credential.
    pub async fn register(&self, login: &str, password: &str) -> Result<CallMetadata, KeeperError> {
        let credential = self.service.register(login, password).await?;
        Ok(metadata_for(credential.as_str()))
    }
}

/// Call metadata carrying `token` under the credential key.
pub fn metadata_for(token: &str) -> CallMetadata {
    CallMetadata::new().with(CREDENTIAL_METADATA_KEY, token)
}
