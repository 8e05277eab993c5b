//! Shared-key guard for the function endpoints.
//!
//! When `FUNCTIONS_API_KEY` is set, every non-`OPTIONS` call must carry it in
//! the `apikey` header or as a bearer token.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::FailureBody;
use crate::state::AppState;

/// Reject function calls without the configured key.
pub async fn require_functions_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config().functions_api_key.as_ref() else {
        return next.run(request).await;
    };
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let matches = presented_keys(request.headers())
        .any(|key| keys_match(key, expected.expose_secret()));
    if !matches {
        tracing::warn!(path = %request.uri().path(), "Function call without a valid API key");
        return (
            StatusCode::UNAUTHORIZED,
            Json(FailureBody {
                success: false,
                error: "Unauthorized".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}

fn presented_keys(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    apikey.into_iter().chain(bearer).map(str::trim)
}

/// Compares SHA-256 digests in constant time, so neither the contents nor
/// the length of the configured key show up in timing.
fn keys_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.as_slice().ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_presented_keys() {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_static("k1"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer k2"));
        assert_eq!(presented_keys(&headers).collect::<Vec<_>>(), ["k1", "k2"]);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_keys(&headers).collect::<Vec<_>>(), ["k1"]);
    }

    #[test]
    fn test_keys_match() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret", "secreT"));
        assert!(!keys_match("secret", "secret2"));
        assert!(!keys_match("", "secret"));
    }
}
