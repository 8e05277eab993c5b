//! Seller email signatures.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use clientdesk_core::SellerId;

use crate::db::{SellerStore, SignatureStore};
use crate::error::AppError;
use crate::middleware::RequireConsoleUser;
use crate::models::{ConsoleUser, EmailSignature};
use crate::services::signature;
use crate::state::AppState;

/// Sellers manage their own signature; admins manage anyone's.
fn check_owner(user: &ConsoleUser, seller_id: SellerId) -> Result<SellerId, AppError> {
    if !user.is_admin() && user.seller_id() != Some(seller_id) {
        return Err(AppError::Forbidden(
            "You can only manage your own signature".to_string(),
        ));
    }
    Ok(seller_id)
}

fn parse_seller_id(raw: &str) -> Result<SellerId, AppError> {
    SellerId::parse(raw).map_err(|_| AppError::NotFound("Seller not found".to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    pub seller_id: SellerId,
    pub html: String,
    /// No stored signature; `html` is the generated one.
    pub is_default: bool,
}

/// GET /api/signatures/{seller_id}
pub async fn show(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
    Path(id): Path<String>,
) -> Result<Json<SignatureResponse>, AppError> {
    let seller_id = check_owner(&user, parse_seller_id(&id)?)?;
    let store = state.store();

    if let Some(stored) = store.get_signature(seller_id).await? {
        return Ok(Json(SignatureResponse {
            seller_id,
            html: stored.html,
            is_default: false,
        }));
    }

    let html = signature::signature_for(store, seller_id).await?;
    Ok(Json(SignatureResponse {
        seller_id,
        html,
        is_default: true,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SignatureUpdate {
    pub html: String,
}

/// PUT /api/signatures/{seller_id}
pub async fn update(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
    Path(id): Path<String>,
    Json(update): Json<SignatureUpdate>,
) -> Result<Json<EmailSignature>, AppError> {
    let seller_id = check_owner(&user, parse_seller_id(&id)?)?;
    let html = update.html.trim();
    if html.is_empty() {
        return Err(AppError::BadRequest("html is required".to_string()));
    }

    let store = state.store();
    if store.get_seller(seller_id).await?.is_none() {
        return Err(AppError::NotFound("Seller not found".to_string()));
    }

    let stored = store.upsert_signature(seller_id, html).await?;
    info!(seller_id = %seller_id, "Signature updated");
    Ok(Json(stored))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectRequest {
    pub seller_id: SellerId,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct InjectResponse {
    pub html: String,
}

/// POST /api/signatures/inject
pub async fn inject(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
    Json(request): Json<InjectRequest>,
) -> Result<Json<InjectResponse>, AppError> {
    let seller_id = check_owner(&user, request.seller_id)?;
    let signature = signature::signature_for(state.store(), seller_id).await?;
    Ok(Json(InjectResponse {
        html: signature::inject(&request.html, &signature),
    }))
}
