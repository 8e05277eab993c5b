//! ClientDesk server library.
//!
//! Client portal, seller/admin console, chat API and the Supabase-style
//! function handlers, as a library so the router can be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;
pub mod supabase;

#[cfg(test)]
pub(crate) mod testing;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::{RateLimiterLayer, request_id_middleware};
use crate::state::AppState;

/// Build the application router with every layer but the listener.
///
/// `login_limiter` guards the login submissions; pass `None` where the
/// client address is unknown, as in tests.
pub fn app<S>(
    state: AppState,
    session_layer: SessionManagerLayer<S>,
    login_limiter: Option<RateLimiterLayer>,
) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(routes::routes(&state, login_limiter))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
