// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keeper credential vault.
//!
//! Every fallible operation in the workspace returns [`KeeperError`]. The
//! transport layer only needs [`KeeperError::status`] and
//! [`KeeperError::public_message`] to answer a caller; the full `Display`
//! output may carry a login or keyword and is meant for logs.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across all Keeper crates.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Configuration errors (missing vault secret, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// No bearer credential was present in the call metadata.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The bearer credential was malformed, forged, or expired.
    #[error("invalid bearer credential: {reason}")]
    InvalidCredential { reason: String },

    /// Login/password pair did not match a stored account.
    #[error("incorrect login or password")]
    IncorrectCredentials,

    /// Registration collided with an existing account.
    #[error("login `{login}` already exists")]
    DuplicateLogin { login: String },

    /// A secret with the same keyword already exists for this login.
    #[error("keyword `{keyword}` already exists")]
    DuplicateKeyword { keyword: String },

    /// No account row for the given login.
    #[error("account `{login}` not found")]
    AccountNotFound { login: String },

    /// A secret was written for a login that has no account row.
    #[error("no account for login `{login}`")]
    UnknownAccount { login: String },

    /// No secret matched the (login, keyword) pair.
    #[error("no data found for keyword `{keyword}`")]
    NoMatch { keyword: String },

    /// Authentication tag did not verify; data was tampered with or the
    /// secret changed.
    #[error("decryption failed: ciphertext is corrupted or was sealed under a different secret")]
    DecryptionFailed,

    /// Storage backend errors (connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A storage operation did not finish within its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error taxonomy used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Conflict,
    NotFound,
    Integrity,
    Transient,
    Internal,
}

/// Transport-neutral status a caller receives for a failed operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum StatusKind {
    AlreadyExists,
    Unauthenticated,
    NotFound,
    Internal,
}

impl KeeperError {
    /// Classify the error into the vault's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KeeperError::MissingCredential => ErrorKind::Validation,
            KeeperError::InvalidCredential { .. } | KeeperError::IncorrectCredentials => {
                ErrorKind::Authentication
            }
            KeeperError::DuplicateLogin { .. } | KeeperError::DuplicateKeyword { .. } => {
                ErrorKind::Conflict
            }
            KeeperError::AccountNotFound { .. } | KeeperError::NoMatch { .. } => {
                ErrorKind::NotFound
            }
            KeeperError::DecryptionFailed => ErrorKind::Integrity,
            KeeperError::Storage { .. } | KeeperError::Timeout { .. } => ErrorKind::Transient,
            KeeperError::Config(_)
            | KeeperError::UnknownAccount { .. }
            | KeeperError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Map the error onto the status reported to the transport layer.
    pub fn status(&self) -> StatusKind {
        match self {
            KeeperError::DuplicateLogin { .. } | KeeperError::DuplicateKeyword { .. } => {
                StatusKind::AlreadyExists
            }
            KeeperError::MissingCredential
            | KeeperError::InvalidCredential { .. }
            | KeeperError::IncorrectCredentials => StatusKind::Unauthenticated,
            KeeperError::NoMatch { .. } | KeeperError::AccountNotFound { .. } => {
                StatusKind::NotFound
            }
            _ => StatusKind::Internal,
        }
    }

    /// Whether the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Generic message safe to return to an unauthenticated caller.
    ///
    /// Never names which half of a credential was wrong and never carries
    /// storage or crypto detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            KeeperError::MissingCredential => "authentication required",
            KeeperError::InvalidCredential { .. } | KeeperError::IncorrectCredentials => {
                "authentication failed"
            }
            KeeperError::DuplicateLogin { .. } => "user already exists",
            KeeperError::DuplicateKeyword { .. } => "data with this keyword already exists",
            KeeperError::NoMatch { .. } | KeeperError::AccountNotFound { .. } => "no data found",
            _ => "internal error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        let cases = [
            (
                KeeperError::DuplicateLogin {
                    login: "alice".into(),
                },
                StatusKind::AlreadyExists,
            ),
            (KeeperError::IncorrectCredentials, StatusKind::Unauthenticated),
            (
                KeeperError::InvalidCredential {
                    reason: "expired".into(),
                },
                StatusKind::Unauthenticated,
            ),
            (KeeperError::MissingCredential, StatusKind::Unauthenticated),
            (
                KeeperError::NoMatch {
                    keyword: "bank".into(),
                },
                StatusKind::NotFound,
            ),
            (
                KeeperError::AccountNotFound {
                    login: "bob".into(),
                },
                StatusKind::NotFound,
            ),
            (KeeperError::DecryptionFailed, StatusKind::Internal),
            (
                KeeperError::Timeout {
                    duration: std::time::Duration::from_secs(5),
                },
                StatusKind::Internal,
            ),
            (
                KeeperError::UnknownAccount {
                    login: "ghost".into(),
                },
                StatusKind::Internal,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "wrong status for {error}");
        }
    }

    #[test]
    fn timeouts_and_storage_failures_are_retryable() {
        let timeout = KeeperError::Timeout {
            duration: std::time::Duration::from_millis(10),
        };
        let storage = KeeperError::Storage {
            source: Box::new(std::io::Error::other("disk")),
        };
        assert!(timeout.is_retryable());
        assert!(storage.is_retryable());
        assert!(!KeeperError::DecryptionFailed.is_retryable());
        assert!(!KeeperError::IncorrectCredentials.is_retryable());
    }

    #[test]
    fn public_messages_do_not_leak_detail() {
        let err = KeeperError::AccountNotFound {
            login: "alice".into(),
        };
        assert!(!err.public_message().contains("alice"));
        assert_eq!(
            KeeperError::IncorrectCredentials.public_message(),
            KeeperError::InvalidCredential {
                reason: "bad signature".into()
            }
            .public_message()
        );
        let storage = KeeperError::Storage {
            source: Box::new(std::io::Error::other("/var/lib/keeper.db locked")),
        };
        assert_eq!(storage.public_message(), "internal error");
    }

    #[test]
    fn status_kind_round_trips_through_strings() {
        use std::str::FromStr;
        for status in [
            StatusKind::AlreadyExists,
            StatusKind::Unauthenticated,
            StatusKind::NotFound,
            StatusKind::Internal,
        ] {
            let parsed = StatusKind::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }
}
