//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (store ping)
//!
//! # Functions (JSON, CORS, optional FUNCTIONS_API_KEY)
//! POST /functions/v1/cleanup-auth-user      - Remove an auth user by email
//! POST /functions/v1/create-seller          - Provision a seller account
//! POST /functions/v1/delete-seller          - Remove a seller and its auth user
//! POST /functions/v1/create-stripe-checkout - Start a checkout session
//! GET|POST /functions/v1/sync-stripe-products - Mirror the Stripe catalog
//! POST /functions/v1/verify-payment-status  - Check a checkout session
//! POST /functions/v1/stripe-webhook         - Stripe events (signed)
//!
//! # Auth
//! GET  /login                               - Portal keypad login page
//! POST /login                               - Portal keypad login (rate limited)
//! GET  /console/login                       - Console login page
//! POST /console/login                       - Console login (rate limited)
//! POST /logout                              - Clear the session
//!
//! # Pages
//! GET  /portal                              - Client/lead dashboard
//! GET  /console                             - Seller/admin dashboard
//!
//! # Chat API (portal or console session)
//! GET  /api/chat/{client_id}/messages       - History (?since=RFC 3339)
//! POST /api/chat/{client_id}/messages       - Send
//! POST /api/chat/{client_id}/read           - Mark the other side read
//! GET  /api/chat/{client_id}/stream         - SSE feed
//!
//! # Console API (console session)
//! GET  /api/console/clients                 - Clients in scope
//! GET  /api/console/leads                   - Leads in scope
//! GET  /api/console/sellers                 - Sellers (admin only)
//! PATCH /api/console/leads/{id}             - Status / assignment
//! POST /api/console/email                   - Email a client
//! GET  /api/signatures/{seller_id}          - Stored or default signature
//! PUT  /api/signatures/{seller_id}          - Store a signature
//! POST /api/signatures/inject               - Sign an HTML body
//! ```

pub mod auth;
pub mod chat;
pub mod console;
pub mod functions;
pub mod portal;
pub mod signatures;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use tracing::warn;

use crate::middleware::RateLimiterLayer;
use crate::state::AppState;

/// Create the login/logout routes. The limiter, when given, applies only
/// to the two login submissions.
pub fn auth_routes(login_limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let portal_login = post(auth::portal_login);
    let console_login = post(auth::console_login);
    let (portal_login, console_login) = match login_limiter {
        Some(limiter) => (
            portal_login.layer(limiter.clone()),
            console_login.layer(limiter),
        ),
        None => (portal_login, console_login),
    };

    Router::new()
        .route("/login", get(auth::portal_login_page).merge(portal_login))
        .route(
            "/console/login",
            get(auth::console_login_page).merge(console_login),
        )
        .route("/logout", post(auth::logout))
}

/// Create the chat API router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{client_id}/messages",
            get(chat::history).post(chat::send),
        )
        .route("/{client_id}/read", post(chat::mark_read))
        .route("/{client_id}/stream", get(chat::stream))
}

/// Create the console API router.
pub fn console_api_routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(console::list_clients))
        .route("/leads", get(console::list_leads))
        .route("/leads/{id}", patch(console::update_lead))
        .route("/sellers", get(console::list_sellers))
        .route("/email", post(console::send_email))
}

/// Create the signature API router.
pub fn signature_routes() -> Router<AppState> {
    Router::new()
        .route("/inject", post(signatures::inject))
        .route(
            "/{seller_id}",
            get(signatures::show).put(signatures::update),
        )
}

/// Create all routes for the server.
pub fn routes(state: &AppState, login_limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/functions/v1", functions::router(state))
        .merge(auth_routes(login_limiter))
        .route("/portal", get(portal::dashboard))
        .route("/console", get(console::dashboard))
        .nest("/api/chat", chat_routes())
        .nest("/api/console", console_api_routes())
        .nest("/api/signatures", signature_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_health_endpoints() {
        let harness = TestHarness::new();

        let response = harness
            .app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = harness
            .app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let harness = TestHarness::new();
        let response = harness
            .app()
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
