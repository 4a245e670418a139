// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM encryption of secret payloads. Metadata is stored as given.
//!
//! The stored layout is `ciphertext || tag` with no nonce prefix; the nonce
//! is re-derived from the vault secret on every call (see [`crate::keys`]).

use keeper_core::KeeperError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use secrecy::SecretString;

use crate::keys::{derive_nonce, field_cipher_key};

fn sealing_key(secret: &SecretString) -> Result<LessSafeKey, KeeperError> {
    let key = field_cipher_key(secret);
    let unbound = UnboundKey::new(&AES_256_GCM, key.as_slice())
        .map_err(|_| KeeperError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt a UTF-8 value under the vault secret.
///
/// Deterministic: the same plaintext and secret always give the same bytes.
pub fn encrypt(plaintext: &str, secret: &SecretString) -> Result<Vec<u8>, KeeperError> {
    let key = sealing_key(secret)?;
    let nonce = Nonce::assume_unique_for_key(derive_nonce(secret)?);

    let mut in_out = plaintext.as_bytes().to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeeperError::Internal("AES-256-GCM encryption failed".to_string()))?;
    Ok(in_out)
}

/// Decrypt bytes produced by [`encrypt`].
///
/// A failed tag check, a truncated buffer, or non-UTF-8 plaintext all yield
/// [`KeeperError::DecryptionFailed`].
pub fn decrypt(ciphertext: &[u8], secret: &SecretString) -> Result<String, KeeperError> {
    let key = sealing_key(secret)?;
    let nonce = Nonce::assume_unique_for_key(derive_nonce(secret)?);

    let mut in_out = ciphertext.to_vec();
    let plaintext = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| KeeperError::DecryptionFailed)?;
    String::from_utf8(plaintext.to_vec()).map_err(|_| KeeperError::DecryptionFailed)
}

/// Field cipher bound to one vault secret.
pub struct FieldCipher {
    secret: SecretString,
}

impl FieldCipher {
    /// Bind a cipher to `secret`, rejecting secrets too short to yield a nonce.
    pub fn new(secret: SecretString) -> Result<Self, KeeperError> {
        derive_nonce(&secret)?;
        Ok(Self { secret })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, KeeperError> {
        encrypt(plaintext, &self.secret)
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<String, KeeperError> {
        decrypt(ciphertext, &self.secret)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
