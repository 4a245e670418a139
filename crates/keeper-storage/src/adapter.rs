// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the VaultStore trait.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use keeper_config::model::StorageConfig;
use keeper_core::{
    HealthStatus, KeeperError, PASSWORD_HASH_LEN, SecretRecord, StoreLifecycle, VaultStore,
};

use crate::database::{Database, storage_err};
use crate::queries;

/// How long the health check waits for the connection before reporting
/// [`HealthStatus::Degraded`].
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_millis(500);

/// SQLite-backed vault store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config`, bootstrapping the schema.
    ///
    /// Lock retries are capped at the operation timeout so a call never
    /// outlives the deadline its caller waits on.
    pub async fn open(config: &StorageConfig) -> Result<Self, KeeperError> {
        let db = Database::open(
            &config.database_path,
            config.connect_timeout(),
            config.wal_mode,
        )
        .await?
        .with_busy_timeout(config.operation_timeout());
        debug!(
            path = %config.database_path,
            busy_timeout = ?db.busy_timeout(),
            "SQLite vault store initialized"
        );
        Ok(Self { db })
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    async fn checkpoint(&self) -> Result<(), KeeperError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl StoreLifecycle for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, KeeperError> {
        let check = self
            .db
            .run(|conn| conn.execute_batch("SELECT 1;"), storage_err);
        Ok(match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, check).await {
            Ok(Ok(())) => HealthStatus::Healthy,
            Ok(Err(e)) => HealthStatus::Unhealthy(e.to_string()),
            Err(_) => {
                warn!(timeout = ?HEALTH_CHECK_TIMEOUT, "storage health check timed out");
                HealthStatus::Degraded(format!(
                    "storage did not answer within {HEALTH_CHECK_TIMEOUT:?}"
                ))
            }
        })
    }

    async fn close(&self) -> Result<(), KeeperError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl VaultStore for SqliteStore {
    async fn create_account(
        &self,
        login: &str,
        password_hash: &[u8; PASSWORD_HASH_LEN],
    ) -> Result<(), KeeperError> {
        queries::accounts::create_account(&self.db, login, password_hash).await
    }

    async fn fetch_password_hash(
        &self,
        login: &str,
    ) -> Result<[u8; PASSWORD_HASH_LEN], KeeperError> {
        queries::accounts::fetch_password_hash(&self.db, login).await
    }

    async fn insert_secret(&self, record: &SecretRecord) -> Result<(), KeeperError> {
        queries::secrets::insert_secret(&self.db, record).await
    }

    async fn fetch_secrets(
        &self,
        login: &str,
        keyword: &str,
    ) -> Result<Vec<SecretRecord>, KeeperError> {
        queries::secrets::fetch_secrets(&self.db, login, keyword).await
    }

    async fn update_secret(&self, record: &SecretRecord) -> Result<(), KeeperError> {
        queries::secrets::update_secret(&self.db, record).await
    }

    async fn delete_secret(&self, login: &str, keyword: &str) -> Result<(), KeeperError> {
        queries::secrets::delete_secret(&self.db, login, keyword).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_str().unwrap().to_string(),
            ..StorageConfig::default()
        }
    }

    fn secret(login: &str, keyword: &str) -> SecretRecord {
        SecretRecord {
            login: login.to_string(),
            keyword: keyword.to_string(),
            data_type: "text".to_string(),
            cipher_payload: vec![0xAB; 20],
            metadata: String::new(),
        }
    }

    #[tokio::test]
    async fn sqlite_store_reports_identity() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&make_config(&dir.path().join("id.db")))
            .await
            .unwrap();
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
    }

    #[tokio::test]
    async fn health_check_is_healthy_after_open() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&make_config(&dir.path().join("health.db")))
            .await
            .unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn data_survives_close_and_reopen() {
        let dir = tempdir().unwrap();
        let config = make_config(&dir.path().join("durable.db"));

        let store = SqliteStore::open(&config).await.unwrap();
        store
            .create_account("alice", &[9; PASSWORD_HASH_LEN])
            .await
            .unwrap();
        store.insert_secret(&secret("alice", "bank")).await.unwrap();
        store.close().await.unwrap();
        drop(store);

        let reopened = SqliteStore::open(&config).await.unwrap();
        assert_eq!(
            reopened.fetch_password_hash("alice").await.unwrap(),
            [9; PASSWORD_HASH_LEN]
        );
        assert_eq!(reopened.fetch_secrets("alice", "bank").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_keyword_have_one_winner() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            SqliteStore::open(&make_config(&dir.path().join("race.db")))
                .await
                .unwrap(),
        );
        store
            .create_account("alice", &[0; PASSWORD_HASH_LEN])
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert_secret(&secret("alice", "bank")).await
            }));
        }

        let mut ok = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(KeeperError::DuplicateKeyword { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.fetch_secrets("alice", "bank").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_registrations_of_same_login_have_one_winner() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            SqliteStore::open(&make_config(&dir.path().join("register.db")))
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..8u8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create_account("alice", &[i; PASSWORD_HASH_LEN]).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(KeeperError::DuplicateLogin { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
    }

    /// Hold the write lock on `path` from another connection until `hold`
    /// elapses. Returns once the lock is taken.
    fn lock_database_for(path: &std::path::Path, hold: Duration) -> thread::JoinHandle<()> {
        let path = path.to_path_buf();
        let (locked_tx, locked_rx) = mpsc::channel();
        let locker = thread::spawn(move || {
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch("BEGIN IMMEDIATE;").unwrap();
            locked_tx.send(()).unwrap();
            thread::sleep(hold);
            conn.execute_batch("COMMIT;").unwrap();
        });
        locked_rx.recv().unwrap();
        locker
    }

    #[tokio::test]
    async fn insert_abandoned_by_its_caller_never_commits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abandon.db");
        let store = SqliteStore::open(&make_config(&path)).await.unwrap();
        store
            .create_account("alice", &[0; PASSWORD_HASH_LEN])
            .await
            .unwrap();

        let locker = lock_database_for(&path, Duration::from_millis(300));
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            store.insert_secret(&secret("alice", "bank")),
        )
        .await;
        assert!(waited.is_err(), "insert should still be waiting on the lock");
        locker.join().unwrap();

        assert!(matches!(
            store.fetch_secrets("alice", "bank").await,
            Err(KeeperError::NoMatch { .. })
        ));
        // Retrying after a timeout is safe: no phantom row makes it a duplicate.
        store.insert_secret(&secret("alice", "bank")).await.unwrap();
        assert_eq!(store.fetch_secrets("alice", "bank").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lock_held_past_busy_timeout_is_a_timeout_without_commit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("busy.db");
        let db = Database::open(path.to_str().unwrap(), Duration::from_secs(10), true)
            .await
            .unwrap()
            .with_busy_timeout(Duration::from_millis(100));
        let store = SqliteStore::from_database(db);
        store
            .create_account("alice", &[0; PASSWORD_HASH_LEN])
            .await
            .unwrap();

        let locker = lock_database_for(&path, Duration::from_millis(400));
        let err = store
            .insert_secret(&secret("alice", "bank"))
            .await
            .unwrap_err();
        assert!(matches!(err, KeeperError::Timeout { .. }));
        assert!(err.is_retryable());
        locker.join().unwrap();

        assert!(matches!(
            store.fetch_secrets("alice", "bank").await,
            Err(KeeperError::NoMatch { .. })
        ));
    }

    #[tokio::test]
    async fn busy_timeout_follows_operation_timeout() {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            operation_timeout_ms: 250,
            ..make_config(&dir.path().join("budget.db"))
        };
        let store = SqliteStore::open(&config).await.unwrap();
        assert_eq!(store.db.busy_timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn stalled_connection_reports_degraded_until_released() {
        let store = Arc::new(SqliteStore::from_database(
            Database::open_in_memory().await.unwrap(),
        ));

        let stalled = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .db
                    .run(
                        |conn| {
                            conn.query_row(
                                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                                 SELECT count(*) FROM c",
                                [],
                                |row| row.get::<_, i64>(0),
                            )
                        },
                        storage_err,
                    )
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));

        stalled.abort();
        assert!(stalled.await.unwrap_err().is_cancelled());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
