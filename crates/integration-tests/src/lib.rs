//! Integration tests for ClientDesk.
//!
//! These tests talk to a running server over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p clientdesk-cli -- migrate
//! cargo run -p clientdesk-server &
//! cargo test -p clientdesk-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `CLIENTDESK_TEST_URL` - Server base URL (default: `http://localhost:3000`)
//! - `FUNCTIONS_API_KEY` - Sent with function calls when the server requires it
//! - `STRIPE_WEBHOOK_SECRET` - Used to sign webhook test events

use reqwest::{Client, RequestBuilder};

/// Base URL of the server under test, without trailing slash.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CLIENTDESK_TEST_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// HTTP client that keeps session cookies and does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// URL of a function endpoint.
#[must_use]
pub fn function_url(name: &str) -> String {
    format!("{}/functions/v1/{name}", base_url())
}

/// Attach the functions key when one is configured.
#[must_use]
pub fn with_functions_key(request: RequestBuilder) -> RequestBuilder {
    match std::env::var("FUNCTIONS_API_KEY") {
        Ok(key) if !key.is_empty() => request.header("apikey", key),
        _ => request,
    }
}
