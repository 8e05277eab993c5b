//! Function endpoints: seller provisioning and Stripe billing.
//!
//! Each handler is independent. Bodies are JSON (an empty body counts as
//! `{}`), replies are `{ "success": true, ... }` or the [`ServiceError`]
//! failure body. Every route answers `OPTIONS` with permissive CORS headers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tracing::instrument;

use crate::error::ServiceError;
use crate::middleware::require_functions_key;
use crate::services::billing::{
    CheckoutCreated, CheckoutInput, PaymentStatus, ProductsSynced, VerifyInput,
};
use crate::services::sellers::{
    CleanupInput, CleanupResult, CreateSellerInput, DeleteSellerInput, Done, SellerCreated,
};
use crate::services::{BillingService, SellerService};
use crate::state::AppState;
use crate::stripe::webhook;

/// Header carrying the webhook signature.
const STRIPE_SIGNATURE: &str = "stripe-signature";

/// Build the `/functions/v1` router.
pub fn router(state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/cleanup-auth-user", post(cleanup_auth_user))
        .route("/create-seller", post(create_seller))
        .route("/delete-seller", post(delete_seller))
        .route("/create-stripe-checkout", post(create_stripe_checkout))
        .route(
            "/sync-stripe-products",
            get(sync_stripe_products).post(sync_stripe_products),
        )
        .route("/verify-payment-status", post(verify_payment_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_functions_key,
        ));

    Router::new()
        .merge(guarded)
        .route("/stripe-webhook", post(stripe_webhook))
        .layer(cors_layer())
}

/// Permissive CORS for browser callers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Parse a JSON body; an empty body is `T::default()`.
fn parse_body<T>(body: &[u8]) -> Result<T, ServiceError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected function body");
        ServiceError::Validation("Invalid JSON body".to_string())
    })
}

/// The payment endpoints answer every failure with a server status.
fn payment_body<T>(body: &[u8]) -> Result<T, ServiceError>
where
    T: DeserializeOwned + Default,
{
    parse_body(body).map_err(|e| match e {
        ServiceError::Validation(msg) => ServiceError::MissingInput(msg),
        other => other,
    })
}

fn billing(state: &AppState) -> BillingService<'_> {
    let mode = state
        .config()
        .stripe
        .as_ref()
        .map(|s| s.checkout_mode)
        .unwrap_or_default();
    BillingService::new(
        state.payments(),
        state.store(),
        &state.config().base_url,
        mode,
    )
}

/// POST /functions/v1/cleanup-auth-user
#[instrument(skip_all)]
async fn cleanup_auth_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CleanupResult>, ServiceError> {
    let input: CleanupInput = parse_body(&body)?;
    SellerService::new(state.auth(), state.store())
        .cleanup_auth_user(input)
        .await
        .map(Json)
}

/// POST /functions/v1/create-seller
#[instrument(skip_all)]
async fn create_seller(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SellerCreated>, ServiceError> {
    let input: CreateSellerInput = parse_body(&body)?;
    SellerService::new(state.auth(), state.store())
        .create(input)
        .await
        .map(Json)
}

/// POST /functions/v1/delete-seller
#[instrument(skip_all)]
async fn delete_seller(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Done>, ServiceError> {
    let input: DeleteSellerInput = parse_body(&body)?;
    SellerService::new(state.auth(), state.store())
        .delete(input)
        .await
        .map(Json)
}

/// POST /functions/v1/create-stripe-checkout
#[instrument(skip_all)]
async fn create_stripe_checkout(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutCreated>, ServiceError> {
    // Configuration is reported before anything about the body.
    if state.payments().is_none() {
        return Err(ServiceError::Config("Stripe is not configured".to_string()));
    }
    let input: CheckoutInput = payment_body(&body)?;
    billing(&state).create_checkout(input).await.map(Json)
}

/// GET|POST /functions/v1/sync-stripe-products
#[instrument(skip_all)]
async fn sync_stripe_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsSynced>, ServiceError> {
    billing(&state).sync_products().await.map(Json)
}

/// POST /functions/v1/verify-payment-status
#[instrument(skip_all)]
async fn verify_payment_status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PaymentStatus>, ServiceError> {
    if state.payments().is_none() {
        return Err(ServiceError::Config("Stripe is not configured".to_string()));
    }
    let input: VerifyInput = payment_body(&body)?;
    billing(&state).verify_payment(input).await.map(Json)
}

/// POST /functions/v1/stripe-webhook
///
/// Signed by Stripe instead of carrying the functions key.
#[instrument(skip_all)]
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let secret = state
        .config()
        .stripe
        .as_ref()
        .and_then(|s| s.webhook_secret.as_ref())
        .ok_or_else(|| ServiceError::Config("Stripe webhook is not configured".to_string()))?;

    let signature = headers
        .get(STRIPE_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::Validation("Missing Stripe-Signature header".to_string()))?;

    let event = webhook::construct_event(&body, signature, secret, chrono::Utc::now().timestamp())
        .map_err(|e| {
            tracing::warn!(error = %e, "Rejected Stripe webhook");
            ServiceError::Validation(e.to_string())
        })?;

    billing(&state).handle_event(event).await?;
    Ok(Json(serde_json::json!({ "received": true })))
}
