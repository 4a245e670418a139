// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer credentials: compact HS256 JWTs carrying the login and an expiry.
//!
//! Tokens are stateless. Any token signed with the current vault secret and
//! not yet expired is accepted; there is no revocation list.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use keeper_core::{Credential, KeeperError, Login};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::token_signing_key;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of an issued credential.
pub const TOKEN_TTL: Duration = Duration::hours(24);

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    login: String,
    exp: i64,
}

fn invalid(reason: &str) -> KeeperError {
    KeeperError::InvalidCredential {
        reason: reason.to_string(),
    }
}

/// Issues and verifies bearer credentials under one signing key.
#[derive(Clone)]
pub struct TokenService {
    key: Zeroizing<Vec<u8>>,
}

impl TokenService {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: token_signing_key(secret),
        }
    }

    /// Issue a credential for `login`, valid for [`TOKEN_TTL`].
    pub fn issue(&self, login: &Login) -> Result<Credential, KeeperError> {
        self.issue_at(login, Utc::now())
    }

    pub fn issue_at(&self, login: &Login, now: DateTime<Utc>) -> Result<Credential, KeeperError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = Claims {
            login: login.as_str().to_string(),
            exp: (now + TOKEN_TTL).timestamp(),
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| KeeperError::Internal(format!("token header encoding: {e}")))?;
        let claims = serde_json::to_vec(&claims)
            .map_err(|e| KeeperError::Internal(format!("token claims encoding: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(Credential(format!("{signing_input}.{signature}")))
    }

    /// Verify a credential and return the login it names.
    pub fn verify(&self, token: &str) -> Result<Login, KeeperError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Login, KeeperError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("malformed token"));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(invalid("unexpected signing method"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| invalid("malformed signature"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| invalid("signature mismatch"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if now.timestamp() >= claims.exp {
            return Err(invalid("token expired"));
        }
        Ok(Login(claims.login))
    }

    fn mac(&self) -> Result<HmacSha256, KeeperError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|_| KeeperError::Internal("invalid HMAC key length".to_string()))
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, KeeperError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| invalid("malformed token segment"))?;
    serde_json::from_slice(&bytes).map_err(|_| invalid("malformed token segment"))
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_string()))
    }

    #[test]
    fn issued_token_verifies_to_same_login() {
        let svc = service("token-secret-0123456789");
        let token = svc.issue(&Login::from("alice")).unwrap();
        assert_eq!(svc.verify(token.as_str()).unwrap(), Login::from("alice"));
    }

    #[test]
    fn token_has_three_segments_and_hs256_header() {
        let svc = service("token-secret-0123456789");
        let token = svc.issue(&Login::from("alice")).unwrap();
        let segments: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(segments.len(), 3);
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segments[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = service("first-secret-0123456789")
            .issue(&Login::from("alice"))
            .unwrap();
        let err = service("second-secret-0123456789")
            .verify(token.as_str())
            .unwrap_err();
        assert!(matches!(err, KeeperError::InvalidCredential { .. }));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service("token-secret-0123456789");
        let issued = Utc::now() - Duration::hours(25);
        let token = svc.issue_at(&Login::from("alice"), issued).unwrap();
        let err = svc.verify(token.as_str()).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn token_is_valid_until_expiry() {
        let svc = service("token-secret-0123456789");
        let now = Utc::now();
        let token = svc.issue_at(&Login::from("bob"), now).unwrap();
        assert!(svc.verify_at(token.as_str(), now + Duration::hours(23)).is_ok());
        assert!(svc.verify_at(token.as_str(), now + TOKEN_TTL).is_err());
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let svc = service("token-secret-0123456789");
        let token = svc.issue(&Login::from("alice")).unwrap();
        let mut segments: Vec<String> = token.as_str().split('.').map(String::from).collect();
        let forged = serde_json::json!({ "login": "mallory", "exp": i64::MAX });
        segments[1] = URL_SAFE_NO_PAD.encode(forged.to_string());
        assert!(svc.verify(&segments.join(".")).is_err());
    }

    #[test]
    fn unsigned_algorithm_is_rejected() {
        let svc = service("token-secret-0123456789");
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(r#"{"login":"alice","exp":9999999999}"#);
        let err = svc.verify(&format!("{header}.{claims}.")).unwrap_err();
        assert!(err.to_string().contains("signing method"));
    }

    #[test]
    fn garbage_is_rejected() {
        let svc = service("token-secret-0123456789");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(svc.verify(token).is_err(), "accepted {token:?}");
        }
    }
}
