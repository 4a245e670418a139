// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault service for the Keeper credential vault.
//!
//! [`VaultService`] composes password hashing, bearer credentials, the field
//! cipher, and a [`keeper_core::VaultStore`] into the six user-facing
//! operations. [`AuthContext`] is the boundary that turns call metadata into
//! an authenticated login.

pub mod auth;
pub mod service;

pub use auth::{AuthContext, CREDENTIAL_METADATA_KEY};
pub use service::VaultService;
