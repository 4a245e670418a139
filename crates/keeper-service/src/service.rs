// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault operations: identity (register, authenticate) and the four
//! login-scoped data operations (add, get, change, delete).

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, error, info, warn};

use keeper_config::KeeperConfig;
use keeper_core::{
    CallMetadata, Credential, HealthStatus, KeeperError, Login, NewSecret, SecretEntry,
    SecretRecord, SecretUpdate, VaultStore,
};
use keeper_crypto::{FieldCipher, TokenService, hash_password, verify_password};
use keeper_storage::SqliteStore;

use crate::auth::AuthContext;

/// Authenticated, field-encrypted access to a [`VaultStore`].
///
/// Holds no per-user state; every data call re-resolves the caller from its
/// metadata and passes the login explicitly to storage.
pub struct VaultService {
    store: Arc<dyn VaultStore>,
    tokens: TokenService,
    auth: AuthContext,
    cipher: FieldCipher,
    storage_timeout: Duration,
}

impl VaultService {
    /// Build a service over `store`, deriving token and cipher keys from
    /// `secret`.
    pub fn new(
        store: Arc<dyn VaultStore>,
        secret: SecretString,
        storage_timeout: Duration,
    ) -> Result<Self, KeeperError> {
        let tokens = TokenService::new(&secret);
        let cipher = FieldCipher::new(secret)?;
        Ok(Self {
            store,
            auth: AuthContext::new(tokens.clone()),
            tokens,
            cipher,
            storage_timeout,
        })
    }

    /// Open the configured SQLite store and build a service over it.
    pub async fn from_config(config: &KeeperConfig) -> Result<Self, KeeperError> {
        let secret = config
            .vault
            .secret()
            .ok_or_else(|| KeeperError::Config("vault.secret is not set".to_string()))?;
        let store = SqliteStore::open(&config.storage).await?;
        Self::new(
            Arc::new(store),
            secret,
            config.storage.operation_timeout(),
        )
    }

    /// Create an account and return a credential for it.
    ///
    /// The account row is the only uniqueness check; a taken login fails
    /// with [`KeeperError::DuplicateLogin`] and issues nothing.
    pub async fn register(&self, login: &str, password: &str) -> Result<Credential, KeeperError> {
        let digest = hash_password(password);
        self.bounded("register", self.store.create_account(login, &digest))
            .await
            .inspect_err(|e| warn!(login, error = %e, "registration failed"))?;

        let credential = self.tokens.issue(&Login::from(login))?;
        info!(login, "account registered");
        Ok(credential)
    }

    /// Check a login/password pair and return a fresh credential.
    ///
    /// An unknown login and a wrong password both fail with
    /// [`KeeperError::IncorrectCredentials`].
    pub async fn authenticate(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Credential, KeeperError> {
        let stored = match self
            .bounded("authenticate", self.store.fetch_password_hash(login))
            .await
        {
            Ok(stored) => stored,
            Err(KeeperError::AccountNotFound { .. }) => {
                warn!(login, "authentication failed");
                return Err(KeeperError::IncorrectCredentials);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password, &stored) {
            warn!(login, "authentication failed");
            return Err(KeeperError::IncorrectCredentials);
        }

        let credential = self.tokens.issue(&Login::from(login))?;
        info!(login, "authenticated");
        Ok(credential)
    }

    /// Encrypt and store a new secret under the caller's login.
    pub async fn add(&self, metadata: &CallMetadata, secret: NewSecret) -> Result<(), KeeperError> {
        let login = self.auth.resolve(metadata)?;
        self.add_for(&login, secret).await
    }

    /// Return every secret stored under `keyword` for the caller, decrypted.
    ///
    /// A record that fails authentication aborts the whole call with
    /// [`KeeperError::DecryptionFailed`]; partial results are never returned.
    pub async fn get(
        &self,
        metadata: &CallMetadata,
        keyword: &str,
    ) -> Result<Vec<SecretEntry>, KeeperError> {
        let login = self.auth.resolve(metadata)?;
        self.get_for(&login, keyword).await
    }

    /// Replace payload and metadata of one of the caller's secrets.
    pub async fn change(
        &self,
        metadata: &CallMetadata,
        update: SecretUpdate,
    ) -> Result<(), KeeperError> {
        let login = self.auth.resolve(metadata)?;
        self.change_for(&login, update).await
    }

    /// Delete one of the caller's secrets.
    pub async fn delete(&self, metadata: &CallMetadata, keyword: &str) -> Result<(), KeeperError> {
        let login = self.auth.resolve(metadata)?;
        self.bounded("delete", self.store.delete_secret(login.as_str(), keyword))
            .await?;
        info!(login = %login, keyword, op = "delete", "secret deleted");
        Ok(())
    }

    /// Storage health, bounded by the operation timeout.
    pub async fn health(&self) -> HealthStatus {
        match self.bounded("health", self.store.health_check()).await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Flush and release the store.
    pub async fn close(&self) -> Result<(), KeeperError> {
        self.store.close().await
    }

    async fn add_for(&self, login: &Login, secret: NewSecret) -> Result<(), KeeperError> {
        let record = SecretRecord {
            login: login.as_str().to_string(),
            cipher_payload: self.cipher.encrypt(&secret.payload)?,
            keyword: secret.keyword,
            data_type: secret.data_type,
            metadata: secret.metadata,
        };
        self.bounded("add", self.store.insert_secret(&record)).await?;
        info!(login = %login, keyword = %record.keyword, op = "add", "secret stored");
        Ok(())
    }

    async fn get_for(&self, login: &Login, keyword: &str) -> Result<Vec<SecretEntry>, KeeperError> {
        let records = self
            .bounded("get", self.store.fetch_secrets(login.as_str(), keyword))
            .await?;

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let payload = self.cipher.decrypt(&record.cipher_payload).inspect_err(|_| {
                error!(
                    login = %login,
                    keyword = %record.keyword,
                    "stored secret failed authentication; possible tampering or corruption"
                );
            })?;
            entries.push(SecretEntry {
                keyword: record.keyword,
                data_type: record.data_type,
                payload,
                metadata: record.metadata,
            });
        }
        debug!(login = %login, keyword, count = entries.len(), op = "get", "secrets read");
        Ok(entries)
    }

    async fn change_for(&self, login: &Login, update: SecretUpdate) -> Result<(), KeeperError> {
        let record = SecretRecord {
            login: login.as_str().to_string(),
            cipher_payload: self.cipher.encrypt(&update.payload)?,
            keyword: update.keyword,
            data_type: String::new(),
            metadata: update.metadata,
        };
        self.bounded("change", self.store.update_secret(&record))
            .await?;
        info!(login = %login, keyword = %record.keyword, op = "change", "secret changed");
        Ok(())
    }

    /// Run a storage call under the operation deadline.
    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, KeeperError>>,
    ) -> Result<T, KeeperError> {
        match tokio::time::timeout(self.storage_timeout, call).await {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(
                    op,
                    timeout = ?self.storage_timeout,
                    "storage operation timed out"
                );
                Err(KeeperError::Timeout {
                    duration: self.storage_timeout,
                })
            }
        }
    }
}

impl std::fmt::Debug for VaultService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("store", &self.store.name())
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_storage::Database;

    const SECRET: &str = "service-unit-test-secret-value";

    async fn service() -> VaultService {
        let store = SqliteStore::from_database(Database::open_in_memory().await.unwrap());
        VaultService::new(
            Arc::new(store),
            SecretString::from(SECRET.to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn md(credential: &Credential) -> CallMetadata {
        CallMetadata::new().with("token", credential.as_str())
    }

    fn new_secret(keyword: &str, payload: &str) -> NewSecret {
        NewSecret {
            keyword: keyword.to_string(),
            data_type: "text".to_string(),
            payload: payload.to_string(),
            metadata: "m".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let svc = service().await;
        svc.register("alice", "pw1").await.unwrap();
        svc.authenticate("alice", "pw1").await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_registration_issues_no_token() {
        let svc = service().await;
        svc.register("alice", "pw1").await.unwrap();
        let err = svc.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, KeeperError::DuplicateLogin { .. }));
        // Original password still works.
        svc.authenticate("alice", "pw1").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_login_and_wrong_password_are_indistinguishable() {
        let svc = service().await;
        svc.register("alice", "pw1").await.unwrap();
        let wrong = svc.authenticate("alice", "nope").await.unwrap_err();
        let unknown = svc.authenticate("ghost", "pw1").await.unwrap_err();
        assert!(matches!(wrong, KeeperError::IncorrectCredentials));
        assert!(matches!(unknown, KeeperError::IncorrectCredentials));
        assert_eq!(wrong.public_message(), unknown.public_message());
    }

    #[tokio::test]
    async fn payload_is_stored_encrypted() {
        let svc = service().await;
        let cred = svc.register("alice", "pw1").await.unwrap();
        svc.add(&md(&cred), new_secret("bank", "s3cr3t")).await.unwrap();

        let raw = svc.store.fetch_secrets("alice", "bank").await.unwrap();
        assert_eq!(raw.len(), 1);
        assert_ne!(raw[0].cipher_payload, b"s3cr3t".to_vec());
        assert_eq!(raw[0].metadata, "m");
    }

    #[tokio::test]
    async fn add_get_change_delete() {
        let svc = service().await;
        let cred = svc.register("alice", "pw1").await.unwrap();
        let md = md(&cred);

        svc.add(&md, new_secret("bank", "s3cr3t")).await.unwrap();
        let got = svc.get(&md, "bank").await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].payload, "s3cr3t");
        assert_eq!(got[0].data_type, "text");

        svc.change(
            &md,
            SecretUpdate {
                keyword: "bank".to_string(),
                payload: "n3w".to_string(),
                metadata: "rotated".to_string(),
            },
        )
        .await
        .unwrap();
        let got = svc.get(&md, "bank").await.unwrap();
        assert_eq!(got[0].payload, "n3w");
        assert_eq!(got[0].metadata, "rotated");
        assert_eq!(got[0].data_type, "text");

        svc.delete(&md, "bank").await.unwrap();
        assert!(matches!(
            svc.get(&md, "bank").await,
            Err(KeeperError::NoMatch { .. })
        ));
        assert!(matches!(
            svc.delete(&md, "bank").await,
            Err(KeeperError::NoMatch { .. })
        ));
    }

    #[tokio::test]
    async fn data_operations_require_a_credential() {
        let svc = service().await;
        let empty = CallMetadata::new();
        assert!(matches!(
            svc.add(&empty, new_secret("k", "v")).await,
            Err(KeeperError::MissingCredential)
        ));
        assert!(matches!(
            svc.get(&empty, "k").await,
            Err(KeeperError::MissingCredential)
        ));
        let bad = CallMetadata::new().with("token", "forged");
        assert!(matches!(
            svc.delete(&bad, "k").await,
            Err(KeeperError::InvalidCredential { .. })
        ));
    }

    #[tokio::test]
    async fn tampered_ciphertext_fails_whole_get() {
        let svc = service().await;
        let cred = svc.register("alice", "pw1").await.unwrap();
        svc.add(&md(&cred), new_secret("bank", "s3cr3t")).await.unwrap();

        let mut raw = svc.store.fetch_secrets("alice", "bank").await.unwrap().remove(0);
        raw.cipher_payload[0] ^= 0xFF;
        svc.store.update_secret(&raw).await.unwrap();

        let err = svc.get(&md(&cred), "bank").await.unwrap_err();
        assert!(matches!(err, KeeperError::DecryptionFailed));
        assert_eq!(err.status(), keeper_core::StatusKind::Internal);
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let svc = service().await;
        assert_eq!(svc.health().await, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn short_secret_is_rejected_at_construction() {
        let store = Database::open_in_memory().await.unwrap();
        let result = VaultService::new(
            Arc::new(SqliteStore::from_database(store)),
            SecretString::from("short".to_string()),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(KeeperError::Config(_))));
    }
}
