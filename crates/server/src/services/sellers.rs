//! Seller provisioning: create and delete sellers together with their auth
//! users, and remove orphaned auth users.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use clientdesk_core::{AuthUserId, Email, SellerId};

use super::non_blank;
use crate::db::{RepositoryError, SellerStore, Store};
use crate::error::ServiceError;
use crate::models::NewSeller;
use crate::models::seller::DEFAULT_COMMISSION_RATE;
use crate::supabase::{AuthBackend, SupabaseError};

/// Body of `create-seller`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSellerInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub commission_rate: Option<Decimal>,
}

/// Success body of `create-seller`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCreated {
    pub success: bool,
    pub seller_id: SellerId,
    pub email: Email,
}

/// Body of `delete-seller`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteSellerInput {
    pub seller_id: Option<String>,
}

/// Success body of `delete-seller` (and other message-only replies).
#[derive(Debug, Serialize)]
pub struct Done {
    pub success: bool,
    pub message: String,
}

/// Body of `cleanup-auth-user`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CleanupInput {
    pub email: Option<String>,
}

/// Success body of `cleanup-auth-user`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_user_id: Option<AuthUserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_email: Option<String>,
}

/// Seller provisioning against the auth backend and the database.
pub struct SellerService<'a> {
    auth: &'a dyn AuthBackend,
    store: &'a dyn Store,
}

impl<'a> SellerService<'a> {
    /// Create a new seller service.
    #[must_use]
    pub fn new(auth: &'a dyn AuthBackend, store: &'a dyn Store) -> Self {
        Self { auth, store }
    }

    /// Create an auth user and its seller row.
    ///
    /// If the row cannot be inserted, the auth user is deleted again; a
    /// failure of that unwind is logged and the insert error is reported.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for missing fields, otherwise
    /// [`ServiceError::Rejected`] with the backend's message.
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn create(&self, input: CreateSellerInput) -> Result<SellerCreated, ServiceError> {
        let (Some(email), Some(password), Some(full_name)) = (
            non_blank(input.email),
            input.password.filter(|p| !p.is_empty()),
            non_blank(input.full_name),
        ) else {
            return Err(ServiceError::Validation(
                "Missing required fields: email, password, fullName".to_string(),
            ));
        };

        let email = Email::parse(&email).map_err(|e| ServiceError::Rejected(e.to_string()))?;
        let password = SecretString::from(password);

        let user = self
            .auth
            .create_user(
                &email,
                &password,
                serde_json::json!({ "full_name": full_name, "role": "seller" }),
            )
            .await
            .map_err(|e| ServiceError::Rejected(e.to_string()))?;

        let new_seller = NewSeller {
            user_id: user.id,
            email: email.clone(),
            full_name,
            phone: non_blank(input.phone),
            commission_rate: input.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE),
        };

        match self.store.insert_seller(new_seller).await {
            Ok(seller) => {
                info!(seller_id = %seller.id, user_id = %user.id, "Seller created");
                Ok(SellerCreated {
                    success: true,
                    seller_id: seller.id,
                    email: seller.email,
                })
            }
            Err(insert_err) => {
                warn!(error = %insert_err, user_id = %user.id, "Seller insert failed, removing auth user");
                if let Err(unwind_err) = self.auth.delete_user(user.id).await {
                    error!(
                        error = %unwind_err,
                        user_id = %user.id,
                        "Failed to remove auth user after seller insert failure"
                    );
                }
                Err(ServiceError::Rejected(insert_err.to_string()))
            }
        }
    }

    /// Delete a seller row and the seller's auth user.
    ///
    /// Clients, leads and chat messages referencing the seller are detached
    /// first. An auth user that is already gone counts as deleted.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] without an id, [`ServiceError::NotFound`]
    /// for an unknown seller, otherwise [`ServiceError::Upstream`].
    #[instrument(skip(self, input), fields(seller_id = ?input.seller_id))]
    pub async fn delete(&self, input: DeleteSellerInput) -> Result<Done, ServiceError> {
        let raw_id = non_blank(input.seller_id)
            .ok_or_else(|| ServiceError::Validation("seller_id is required".to_string()))?;
        let not_found = || ServiceError::NotFound("Seller not found".to_string());
        let id = SellerId::parse(&raw_id).map_err(|_| not_found())?;

        let seller = match self.store.delete_seller(id).await {
            Ok(seller) => seller,
            Err(RepositoryError::NotFound) => return Err(not_found()),
            Err(e) => return Err(ServiceError::upstream(e)),
        };

        match self.auth.delete_user(seller.user_id).await {
            Ok(()) => {}
            Err(SupabaseError::UserNotFound) => {
                warn!(user_id = %seller.user_id, "Seller auth user was already gone");
            }
            Err(e) => return Err(ServiceError::upstream(e)),
        }

        info!(seller_id = %seller.id, "Seller deleted");
        Ok(Done {
            success: true,
            message: format!("Seller {} deleted", seller.email),
        })
    }

    /// Delete the auth user registered under an email, if any.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] without an email, otherwise
    /// [`ServiceError::Upstream`].
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn cleanup_auth_user(
        &self,
        input: CleanupInput,
    ) -> Result<CleanupResult, ServiceError> {
        let raw = non_blank(input.email)
            .ok_or_else(|| ServiceError::Validation("Email is required".to_string()))?;
        let email = Email::parse(&raw).map_err(|e| ServiceError::Validation(e.to_string()))?;

        let Some(user) = self.auth.find_user_by_email(&email).await? else {
            return Ok(CleanupResult {
                success: true,
                message: format!("No auth user found for {email}"),
                deleted_user_id: None,
                deleted_email: None,
            });
        };

        self.auth.delete_user(user.id).await?;
        info!(user_id = %user.id, "Orphaned auth user deleted");

        Ok(CleanupResult {
            success: true,
            message: format!("Deleted auth user for {email}"),
            deleted_user_id: Some(user.id),
            deleted_email: Some(email.into_inner()),
        })
    }
}
