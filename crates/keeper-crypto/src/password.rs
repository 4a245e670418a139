// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account password digests.
//!
//! Passwords are stored as an unsalted SHA-256 digest so that existing
//! account rows keep verifying. Comparison is constant-time.

use keeper_core::PASSWORD_HASH_LEN;
use sha2::{Digest, Sha256};

/// Hash a password for storage or comparison.
pub fn hash_password(password: &str) -> [u8; PASSWORD_HASH_LEN] {
    Sha256::digest(password.as_bytes()).into()
}

/// Re-hash `password` and compare it against a stored digest.
pub fn verify_password(password: &str, stored: &[u8; PASSWORD_HASH_LEN]) -> bool {
    constant_time_eq(&hash_password(password), stored)
}

fn constant_time_eq(a: &[u8; PASSWORD_HASH_LEN], b: &[u8; PASSWORD_HASH_LEN]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
