// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage capability for accounts and per-login secret records.

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::traits::lifecycle::StoreLifecycle;
use crate::types::{SecretRecord, PASSWORD_HASH_LEN};

/// Durable, login-scoped CRUD over accounts and secrets.
///
/// Uniqueness of `login` and of `(login, keyword)` must be enforced by the
/// backend itself so that concurrent writers race to exactly one winner.
/// Every operation that touches secrets takes the owning login and never
/// returns rows belonging to another login.
#[async_trait]
pub trait VaultStore: StoreLifecycle {
    /// Creates an account. Fails with [`KeeperError::DuplicateLogin`] when
    /// the login is taken.
    async fn create_account(
        &self,
        login: &str,
        password_hash: &[u8; PASSWORD_HASH_LEN],
    ) -> Result<(), KeeperError>;

    /// Returns the stored password digest. Fails with
    /// [`KeeperError::AccountNotFound`] when the login does not exist.
    async fn fetch_password_hash(&self, login: &str)
    -> Result<[u8; PASSWORD_HASH_LEN], KeeperError>;

    /// Inserts a new secret. Fails with [`KeeperError::DuplicateKeyword`] on
    /// a `(login, keyword)` conflict and [`KeeperError::UnknownAccount`] when
    /// the login has no account.
    async fn insert_secret(&self, record: &SecretRecord) -> Result<(), KeeperError>;

    /// Returns every record for `(login, keyword)`. Fails with
    /// [`KeeperError::NoMatch`] when nothing matches.
    async fn fetch_secrets(
        &self,
        login: &str,
        keyword: &str,
    ) -> Result<Vec<SecretRecord>, KeeperError>;

    /// Rewrites payload and metadata of an existing record. Fails with
    /// [`KeeperError::NoMatch`] when no row was affected.
    async fn update_secret(&self, record: &SecretRecord) -> Result<(), KeeperError>;

    /// Removes a record. Fails with [`KeeperError::NoMatch`] when no row was
    /// removed.
    async fn delete_secret(&self, login: &str, keyword: &str) -> Result<(), KeeperError>;
}
