// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential extraction middleware for the secret routes.
//!
//! The middleware does not decide anything. It copies the bearer credential
//! from the request headers into a [`CallMetadata`] extension, and the vault
//! service verifies it on every call. Two header forms are accepted, checked
//! in order:
//! 1. `token: <credential>`
//! 2. `Authorization: Bearer <credential>`

use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use keeper_core::CallMetadata;
use keeper_service::CREDENTIAL_METADATA_KEY;

/// Build call metadata from request headers.
pub fn metadata_from_headers(headers: &HeaderMap) -> CallMetadata {
    let mut metadata = CallMetadata::new();

    let token = headers
        .get(CREDENTIAL_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });

    if let Some(token) = token {
        metadata.insert(CREDENTIAL_METADATA_KEY, token);
    }
    metadata
}

/// Attach [`CallMetadata`] to the request for downstream handlers.
pub async fn credential_middleware(mut request: Request, next: Next) -> Response {
    let metadata = metadata_from_headers(request.headers());
    if metadata.is_empty() {
        tracing::debug!(path = %request.uri().path(), "request carries no credential");
    }
    request.extensions_mut().insert(metadata);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_header_is_copied() {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("abc.def.ghi"));
        let md = metadata_from_headers(&headers);
        assert_eq!(md.get("token"), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_authorization_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        let md = metadata_from_headers(&headers);
        assert_eq!(md.get("token"), Some("abc.def.ghi"));
    }

    #[test]
    fn token_header_wins_over_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("from-token"));
        headers.insert("authorization", HeaderValue::from_static("Bearer from-auth"));
        let md = metadata_from_headers(&headers);
        assert_eq!(md.get("token"), Some("from-token"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(metadata_from_headers(&headers).is_empty());
    }
}
