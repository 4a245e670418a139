// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the vault service, its storage backends, and the
//! transport layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Length in bytes of an account password digest.
pub const PASSWORD_HASH_LEN: usize = 32;

/// A login whose identity has been established for the current call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Login(pub String);

impl Login {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Login {
    fn from(value: &str) -> Self {
        Login(value.to_string())
    }
}

/// A signed bearer credential returned by register/authenticate.
///
/// Debug output omits the token so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(pub String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// Per-call metadata handed over by the transport layer.
///
/// Keys are case-insensitive and stored lowercased, matching how HTTP
/// headers and gRPC metadata behave.
#[derive(Clone, Default)]
pub struct CallMetadata {
    entries: HashMap<String, String>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the same key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Builder-style variant of [`CallMetadata::insert`].
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CallMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values may be bearer credentials; only the keys are printed.
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("CallMetadata").field("keys", &keys).finish()
    }
}

/// A secret row as persisted: the payload is already sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRecord {
    pub login: String,
    pub keyword: String,
    pub data_type: String,
    pub cipher_payload: Vec<u8>,
    pub metadata: String,
}

/// Plaintext secret submitted by a caller for the add path.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSecret {
    pub keyword: String,
    #[serde(default)]
    pub data_type: String,
    pub payload: String,
    #[serde(default)]
    pub metadata: String,
}

/// Replacement payload and metadata for the change path.
///
/// `keyword` identifies the row; login and keyword are never rewritten.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretUpdate {
    pub keyword: String,
    pub payload: String,
    #[serde(default)]
    pub metadata: String,
}

/// Decrypted secret returned to the owning caller.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub keyword: String,
    pub data_type: String,
    pub payload: String,
    pub metadata: String,
}

macro_rules! redact_payload_debug {
    ($ty:ident { $($field:ident),* }) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .field("payload", &"[REDACTED]")
                    .finish()
            }
        }
    };
}

redact_payload_debug!(NewSecret { keyword, data_type, metadata });
redact_payload_debug!(SecretUpdate { keyword, metadata });
redact_payload_debug!(SecretEntry { keyword, data_type, metadata });

/// Health status reported by storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}
