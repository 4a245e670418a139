// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Keeper credential vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level Keeper configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. Every section defaults except `vault.secret`, which validation
/// requires.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeeperConfig {
    /// Listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Vault secret settings.
    #[serde(default)]
    pub vault: VaultConfig,
}

/// Listener configuration for the transport layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Deadline for a single storage operation, in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Deadline for opening the database and running migrations, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl StorageConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            operation_timeout_ms: default_operation_timeout_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("keeper").join("keeper.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("keeper.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_operation_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Vault secret configuration.
///
/// The secret signs bearer credentials and keys the field cipher. It is
/// never serialized back out and Debug output redacts it.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Shared vault secret. Usually supplied via `KEEPER_VAULT_SECRET`.
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

impl VaultConfig {
    /// The configured secret wrapped for in-memory handling, if present.
    pub fn secret(&self) -> Option<SecretString> {
        self.secret.clone().map(SecretString::from)
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = KeeperConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.log_level, "info");
        assert!(config.storage.database_path.ends_with("keeper.db"));
        assert!(config.storage.wal_mode);
        assert_eq!(config.storage.operation_timeout(), Duration::from_secs(5));
        assert_eq!(config.storage.connect_timeout(), Duration::from_secs(10));
        assert!(config.vault.secret.is_none());
    }

    #[test]
    fn vault_debug_redacts_secret() {
        let vault = VaultConfig {
            secret: Some("correct horse battery staple".to_string()),
        };
        let debug = format!("{vault:?}");
        assert!(!debug.contains("horse"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn secret_is_never_serialized() {
        let config = KeeperConfig {
            vault: VaultConfig {
                secret: Some("do-not-write-me-out".to_string()),
            },
            ..Default::default()
        };
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("do-not-write-me-out"));
    }
}
