// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account rows: creation and password-digest lookup.

use keeper_core::{KeeperError, PASSWORD_HASH_LEN};
use rusqlite::{OptionalExtension, params};

use crate::database::{Constraint, Database, constraint_violation, storage_err};

/// Insert an account. The primary key decides races between concurrent
/// registrations of the same login.
pub async fn create_account(
    db: &Database,
    login: &str,
    password_hash: &[u8; PASSWORD_HASH_LEN],
) -> Result<(), KeeperError> {
    let owned_login = login.to_string();
    let hash = password_hash.to_vec();
    db.run(
        move |conn| {
            conn.execute(
                "INSERT INTO accounts (login, password_hash) VALUES (?1, ?2)",
                params![owned_login, hash],
            )
            .map(|_| ())
        },
        |e| match constraint_violation(&e) {
            Some(Constraint::Unique) => KeeperError::DuplicateLogin {
                login: login.to_string(),
            },
            _ => storage_err(e),
        },
    )
    .await
}

/// Fetch the stored password digest for `login`.
pub async fn fetch_password_hash(
    db: &Database,
    login: &str,
) -> Result<[u8; PASSWORD_HASH_LEN], KeeperError> {
    let owned_login = login.to_string();
    let stored: Option<Vec<u8>> = db
        .run(
            move |conn| {
                conn.query_row(
                    "SELECT password_hash FROM accounts WHERE login = ?1",
                    params![owned_login],
                    |row| row.get(0),
                )
                .optional()
            },
            storage_err,
        )
        .await?;

    let stored = stored.ok_or_else(|| KeeperError::AccountNotFound {
        login: login.to_string(),
    })?;
    <[u8; PASSWORD_HASH_LEN]>::try_from(stored.as_slice()).map_err(|_| KeeperError::Storage {
        source: format!(
            "password digest for `{login}` has {} bytes, expected {PASSWORD_HASH_LEN}",
            stored.len()
        )
        .into(),
    })
}
