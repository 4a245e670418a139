// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keeper.toml` > `~/.config/keeper/keeper.toml` > `/etc/keeper/keeper.toml`
//! with environment variable overrides via `KEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KeeperConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keeper/keeper.toml";

/// Config file name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "keeper.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keeper/keeper.toml` (system-wide)
/// 3. `~/.config/keeper/keeper.toml` (user XDG config)
/// 4. `./keeper.toml` (local directory)
/// 5. `KEEPER_*` environment variables
pub fn load_config() -> Result<KeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeeperConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/keeper/keeper.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("keeper").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `KEEPER_STORAGE_DATABASE_PATH` maps to `storage.database_path`, not
/// `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("KEEPER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let mapped = key
            .as_str()
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("vault_", "vault.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("KEEPER_VAULT_SECRET", "env-provided-secret");
            jail.set_env("KEEPER_STORAGE_DATABASE_PATH", "/tmp/env.db");
            jail.set_env("KEEPER_SERVER_PORT", "7070");

            let config = load_config().expect("env config should load");
            assert_eq!(config.vault.secret.as_deref(), Some("env-provided-secret"));
            assert_eq!(config.storage.database_path, "/tmp/env.db");
            assert_eq!(config.server.port, 7070);
            Ok(())
        });
    }

    #[test]
    fn local_file_is_read_and_env_wins() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
[server]
port = 8080
log_level = "debug"

[vault]
secret = "file-secret-value"
"#,
            )?;
            jail.set_env("KEEPER_SERVER_PORT", "9191");

            let config = load_config().expect("local config should load");
            assert_eq!(config.server.port, 9191);
            assert_eq!(config.server.log_level, "debug");
            assert_eq!(config.vault.secret.as_deref(), Some("file-secret-value"));
            Ok(())
        });
    }
}
