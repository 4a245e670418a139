// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request authentication boundary.
//!
//! Every data operation resolves the caller's login from the call metadata
//! before touching storage. Nothing is cached between calls.

use keeper_core::{CallMetadata, KeeperError, Login};
use keeper_crypto::TokenService;

/// Metadata key that carries the bearer credential.
pub const CREDENTIAL_METADATA_KEY: &str = "token";

/// Recovers the authenticated login from transport metadata.
#[derive(Debug, Clone)]
pub struct AuthContext {
    tokens: TokenService,
}

impl AuthContext {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }

    /// Verify the credential under [`CREDENTIAL_METADATA_KEY`] and return
    /// the login it was issued to.
    ///
    /// Fails with [`KeeperError::MissingCredential`] when the key is absent
    /// or blank, and with [`KeeperError::InvalidCredential`] when the token
    /// does not verify.
    pub fn resolve(&self, metadata: &CallMetadata) -> Result<Login, KeeperError> {
        let token = metadata
            .get(CREDENTIAL_METADATA_KEY)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(KeeperError::MissingCredential)?;

        self.tokens.verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "credential rejected");
        })
    }
}
