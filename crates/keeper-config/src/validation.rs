// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express. All failures are collected so a
//! single startup attempt reports every problem.

use crate::diagnostic::ConfigError;
use crate::model::KeeperConfig;

/// The vault secret must be at least as long as the cipher nonce, which is
/// cut from its trailing bytes.
pub const MIN_SECRET_LEN: usize = 12;

/// Secrets shorter than this still work but are logged as weak.
const RECOMMENDED_SECRET_LEN: usize = 32;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &KeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match config.vault.secret.as_deref() {
        None | Some("") => errors.push(ConfigError::MissingKey {
            key: "vault.secret".to_string(),
        }),
        Some(secret) if secret.len() < MIN_SECRET_LEN => {
            errors.push(ConfigError::Validation {
                message: format!(
                    "vault.secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                    secret.len()
                ),
            });
        }
        Some(secret) if secret.len() < RECOMMENDED_SECRET_LEN => {
            tracing::warn!(
                len = secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "vault.secret is shorter than recommended"
            );
        }
        Some(_) => {}
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.operation_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.operation_timeout_ms must be greater than zero".to_string(),
        });
    }

    if config.storage.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.connect_timeout_secs must be greater than zero".to_string(),
        });
    }

    let host = config.server.host.trim();
    let is_valid_host = !host.is_empty()
        && (host.parse::<std::net::IpAddr>().is_ok()
            || host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-'));
    if !is_valid_host {
        errors.push(ConfigError::Validation {
            message: format!("server.host `{host}` is not a valid IP address or hostname"),
        });
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level `{}` is not one of {}",
                config.server.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VaultConfig;

    fn valid_config() -> KeeperConfig {
        KeeperConfig {
            vault: VaultConfig {
                secret: Some("0123456789abcdef0123456789abcdef".to_string()),
            },
            ..Default::default()
        }
    }

    #[test]
    fn default_config_with_secret_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn missing_secret_is_reported() {
        let errors = validate_config(&KeeperConfig::default()).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::MissingKey { key } if key == "vault.secret")
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut config = valid_config();
        config.vault.secret = Some("short".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("at least 12 bytes"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = KeeperConfig::default();
        config.storage.database_path = "  ".to_string();
        config.storage.operation_timeout_ms = 0;
        config.server.host = "bad host!".to_string();
        config.server.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        // missing secret + path + timeout + host + log level
        assert_eq!(errors.len(), 5);
    }
}
