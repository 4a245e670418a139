// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keeper credential vault.
//!
//! Holds the shared error type, the domain types passed between the
//! service, storage, and transport crates, and the storage traits that
//! every backend implements.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, KeeperError, StatusKind};
pub use traits::{StoreLifecycle, VaultStore};
pub use types::{
    CallMetadata, Credential, HealthStatus, Login, NewSecret, SecretEntry,
    SecretRecord, SecretUpdate, PASSWORD_HASH_LEN,
};
