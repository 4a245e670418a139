// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key material derived from the vault secret.
//!
//! One configured secret currently feeds two cryptographically distinct
//! roles. Each role has its own derivation function so either can be moved
//! to a separate secret without touching its callers.
//!
//! [`derive_nonce`] is a known limitation: the field-cipher nonce is cut
//! from the secret, so every value sealed under one secret shares a single
//! (key, nonce) pair. Each value is still confidential and authenticated,
//! but two ciphertexts of equal length reveal the XOR of their plaintexts.
//! Changing this changes the stored format and needs a migration.

use keeper_core::KeeperError;
use ring::aead::NONCE_LEN;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length in bytes of the field-cipher key.
pub const FIELD_KEY_LEN: usize = 32;

/// HMAC key for signing bearer credentials: the raw secret bytes.
pub fn token_signing_key(secret: &SecretString) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(secret.expose_secret().as_bytes().to_vec())
}

/// AES-256-GCM key for field encryption: SHA-256 of the secret.
pub fn field_cipher_key(secret: &SecretString) -> Zeroizing<[u8; FIELD_KEY_LEN]> {
    Zeroizing::new(Sha256::digest(secret.expose_secret().as_bytes()).into())
}

/// Field-cipher nonce: the trailing [`NONCE_LEN`] bytes of the secret.
pub fn derive_nonce(secret: &SecretString) -> Result<[u8; NONCE_LEN], KeeperError> {
    let bytes = secret.expose_secret().as_bytes();
    if bytes.len() < NONCE_LEN {
        return Err(KeeperError::Config(format!(
            "vault secret must be at least {NONCE_LEN} bytes"
        )));
    }
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&bytes[bytes.len() - NONCE_LEN..]);
    Ok(nonce)
}
