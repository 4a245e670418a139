// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret rows. Every statement is filtered by login.

use keeper_core::{KeeperError, SecretRecord};
use rusqlite::params;

use crate::database::{Constraint, Database, constraint_violation, storage_err};

/// Insert a sealed secret.
pub async fn insert_secret(db: &Database, record: &SecretRecord) -> Result<(), KeeperError> {
    let row = record.clone();
    db.run(
        move |conn| {
            conn.execute(
                "INSERT INTO secrets (login, keyword, data_type, payload, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.login,
                    row.keyword,
                    row.data_type,
                    row.cipher_payload,
                    row.metadata,
                ],
            )
            .map(|_| ())
        },
        |e| match constraint_violation(&e) {
            Some(Constraint::Unique) => KeeperError::DuplicateKeyword {
                keyword: record.keyword.clone(),
            },
            Some(Constraint::ForeignKey) => KeeperError::UnknownAccount {
                login: record.login.clone(),
            },
            None => storage_err(e),
        },
    )
    .await
}

/// Fetch the rows stored under `(login, keyword)`.
pub async fn fetch_secrets(
    db: &Database,
    login: &str,
    keyword: &str,
) -> Result<Vec<SecretRecord>, KeeperError> {
    let owned_login = login.to_string();
    let owned_keyword = keyword.to_string();
    let rows = db
        .run(
            move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT keyword, data_type, payload, metadata
                     FROM secrets WHERE login = ?1 AND keyword = ?2",
                )?;
                let rows = stmt.query_map(params![owned_login, owned_keyword], |row| {
                    Ok(SecretRecord {
                        login: owned_login.clone(),
                        keyword: row.get(0)?,
                        data_type: row.get(1)?,
                        cipher_payload: row.get(2)?,
                        metadata: row.get(3)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            },
            storage_err,
        )
        .await?;

    if rows.is_empty() {
        return Err(KeeperError::NoMatch {
            keyword: keyword.to_string(),
        });
    }
    Ok(rows)
}

/// Replace payload and metadata of an existing row.
pub async fn update_secret(db: &Database, record: &SecretRecord) -> Result<(), KeeperError> {
    let row = record.clone();
    let affected = db
        .run(
            move |conn| {
                conn.execute(
                    "UPDATE secrets SET payload = ?1, metadata = ?2
                     WHERE login = ?3 AND keyword = ?4",
                    params![row.cipher_payload, row.metadata, row.login, row.keyword],
                )
            },
            storage_err,
        )
        .await?;

    if affected == 0 {
        return Err(KeeperError::NoMatch {
            keyword: record.keyword.clone(),
        });
    }
    Ok(())
}

/// Remove the row stored under `(login, keyword)`.
pub async fn delete_secret(db: &Database, login: &str, keyword: &str) -> Result<(), KeeperError> {
    let owned_login = login.to_string();
    let owned_keyword = keyword.to_string();
    let affected = db
        .run(
            move |conn| {
                conn.execute(
                    "DELETE FROM secrets WHERE login = ?1 AND keyword = ?2",
                    params![owned_login, owned_keyword],
                )
            },
            storage_err,
        )
        .await?;

    if affected == 0 {
        return Err(KeeperError::NoMatch {
            keyword: keyword.to_string(),
        });
    }
    Ok(())
}
