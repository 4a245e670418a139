// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic primitives for the Keeper credential vault.
//!
//! - [`password`]: SHA-256 password digests with constant-time comparison.
//! - [`cipher`]: AES-256-GCM sealing of secret payloads.
//! - [`token`]: HS256 bearer credentials with a 24-hour lifetime.
//! - [`keys`]: derivation of per-role key material from the vault secret.

pub mod cipher;
pub mod keys;
pub mod password;
pub mod token;

pub use cipher::{FieldCipher, decrypt, encrypt};
pub use password::{hash_password, verify_password};
pub use token::{TOKEN_TTL, TokenService};
