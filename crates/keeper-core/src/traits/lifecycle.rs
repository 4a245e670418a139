// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base lifecycle trait every storage backend implements.

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::types::HealthStatus;

/// Identity, health, and shutdown hooks for a storage backend.
#[async_trait]
pub trait StoreLifecycle: Send + Sync + 'static {
    /// Returns the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Returns the semantic version of this backend.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the backend's current status.
    async fn health_check(&self) -> Result<HealthStatus, KeeperError>;

    /// Flushes pending writes and releases held resources.
    async fn close(&self) -> Result<(), KeeperError>;
}
