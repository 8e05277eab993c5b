//! Checkout, product sync and payment verification against the payment
//! provider.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use clientdesk_core::{ClientId, SubscriptionStatus};

use super::non_blank;
use crate::config::CheckoutMode;
use crate::db::{ClientStore, ProductStore, RepositoryError, Store};
use crate::error::ServiceError;
use crate::models::{Product, ProductSync};
use crate::stripe::{CheckoutRequest, CheckoutSession, Event, PaymentProvider};

/// Body of `create-stripe-checkout`.
///
/// Fields are read leniently: anything but a non-blank string counts as
/// missing for `priceId`/`clientId`, and `employeeCount` may be a number or
/// a numeric string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutInput {
    pub price_id: Option<serde_json::Value>,
    pub client_id: Option<serde_json::Value>,
    pub employee_count: Option<serde_json::Value>,
}

/// Success body of `create-stripe-checkout`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCreated {
    pub success: bool,
    pub session_id: String,
    pub url: Option<String>,
}

/// Success body of `sync-stripe-products`.
#[derive(Debug, Serialize)]
pub struct ProductsSynced {
    pub success: bool,
    pub message: String,
    pub products: Vec<Product>,
}

/// Body of `verify-payment-status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyInput {
    pub session_id: Option<String>,
}

/// Success body of `verify-payment-status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub success: bool,
    pub is_paid: bool,
    pub is_complete: bool,
    pub payment_status: String,
    pub session_status: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
}

/// Billing operations.
pub struct BillingService<'a> {
    payments: Option<&'a dyn PaymentProvider>,
    store: &'a dyn Store,
    base_url: &'a str,
    mode: CheckoutMode,
}

impl<'a> BillingService<'a> {
    /// Create a new billing service. `payments` is `None` when Stripe is not
    /// configured.
    #[must_use]
    pub fn new(
        payments: Option<&'a dyn PaymentProvider>,
        store: &'a dyn Store,
        base_url: &'a str,
        mode: CheckoutMode,
    ) -> Self {
        Self {
            payments,
            store,
            base_url,
            mode,
        }
    }

    fn payments(&self) -> Result<&'a dyn PaymentProvider, ServiceError> {
        self.payments
            .ok_or_else(|| ServiceError::Config("Stripe is not configured".to_string()))
    }

    /// Start a hosted checkout for a price.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] without Stripe, [`ServiceError::MissingInput`]
    /// without a `priceId`, otherwise [`ServiceError::Upstream`].
    #[instrument(skip(self, input))]
    pub async fn create_checkout(
        &self,
        input: CheckoutInput,
    ) -> Result<CheckoutCreated, ServiceError> {
        let payments = self.payments()?;
        let price_id = text(input.price_id)
            .ok_or_else(|| ServiceError::MissingInput("priceId is required".to_string()))?;
        let client_ref = text(input.client_id);
        let client_id = client_ref.as_deref().and_then(|c| ClientId::parse(c).ok());

        let customer_email = match client_id {
            Some(id) => match self.store.get_client(id).await {
                Ok(client) => client.map(|c| c.email.into_inner()),
                Err(e) => {
                    warn!(error = %e, client_id = %id, "Could not load client for checkout");
                    None
                }
            },
            None => None,
        };

        let request = CheckoutRequest {
            price_id,
            quantity: quantity(input.employee_count.as_ref()),
            mode: self.mode,
            success_url: format!(
                "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/pricing", self.base_url),
            client_reference_id: client_ref,
            customer_email,
        };

        let session = payments
            .create_checkout_session(&request)
            .await
            .map_err(ServiceError::upstream)?;

        if let Some(id) = client_id {
            self.update_client(id, SubscriptionStatus::Pending, None)
                .await;
        }

        info!(session_id = %session.id, "Checkout session created");
        Ok(CheckoutCreated {
            success: true,
            session_id: session.id,
            url: session.url,
        })
    }

    /// Mirror the provider's active products into the local catalog.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] without Stripe, otherwise
    /// [`ServiceError::Upstream`].
    #[instrument(skip(self))]
    pub async fn sync_products(&self) -> Result<ProductsSynced, ServiceError> {
        let payments = self.payments()?;
        let remote = payments
            .list_active_products()
            .await
            .map_err(ServiceError::upstream)?;

        let products = self
            .store
            .upsert_products(remote.into_iter().map(ProductSync::from).collect())
            .await
            .map_err(ServiceError::upstream)?;

        info!(count = products.len(), "Products synced");
        Ok(ProductsSynced {
            success: true,
            message: format!("Synced {} products", products.len()),
            products,
        })
    }

    /// Report the state of a checkout session.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Config`] without Stripe, [`ServiceError::MissingInput`]
    /// without a `sessionId`, otherwise [`ServiceError::Upstream`].
    #[instrument(skip(self, input), fields(session_id = ?input.session_id))]
    pub async fn verify_payment(&self, input: VerifyInput) -> Result<PaymentStatus, ServiceError> {
        let payments = self.payments()?;
        let session_id = non_blank(input.session_id)
            .ok_or_else(|| ServiceError::MissingInput("sessionId is required".to_string()))?;

        let session = payments
            .retrieve_checkout_session(&session_id)
            .await
            .map_err(ServiceError::upstream)?;

        if session.is_paid() {
            self.activate_from_session(&session).await;
        }

        Ok(PaymentStatus {
            success: true,
            is_paid: session.is_paid(),
            is_complete: session.is_complete(),
            customer_email: session.email().map(String::from),
            payment_status: session.payment_status,
            session_status: session.status,
            amount: session.amount_total,
            currency: session.currency,
        })
    }

    /// Apply a verified webhook event.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Upstream`] if the database update fails.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle_event(&self, event: Event) -> Result<(), ServiceError> {
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSession = serde_json::from_value(event.data.object)
                    .map_err(|e| ServiceError::Validation(e.to_string()))?;
                if session.is_paid() {
                    self.activate_from_session(&session).await;
                }
            }
            "customer.subscription.deleted" => {
                if let Some(customer) = event.data.object.get("customer").and_then(|c| c.as_str())
                {
                    let changed = self
                        .store
                        .set_status_by_stripe_customer(customer, SubscriptionStatus::Canceled)
                        .await
                        .map_err(ServiceError::upstream)?;
                    info!(customer, changed, "Subscription canceled");
                }
            }
            other => debug!(event_type = other, "Ignoring Stripe event"),
        }
        Ok(())
    }

    async fn activate_from_session(&self, session: &CheckoutSession) {
        let Some(id) = session.client_reference().and_then(|c| ClientId::parse(c).ok()) else {
            return;
        };
        self.update_client(id, SubscriptionStatus::Active, session.customer.as_deref())
            .await;
    }

    /// Best-effort status update; failures are logged only.
    async fn update_client(
        &self,
        id: ClientId,
        status: SubscriptionStatus,
        stripe_customer_id: Option<&str>,
    ) {
        match self
            .store
            .set_subscription_status(id, status, stripe_customer_id)
            .await
        {
            Ok(()) => debug!(client_id = %id, %status, "Client subscription updated"),
            Err(RepositoryError::NotFound) => {
                warn!(client_id = %id, "Checkout references an unknown client");
            }
            Err(e) => warn!(error = %e, client_id = %id, "Failed to update client subscription"),
        }
    }
}

/// A non-blank string value.
fn text(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) => non_blank(Some(s)),
        _ => None,
    }
}

/// Line-item quantity from `employeeCount`; at least 1.
#[allow(clippy::cast_possible_truncation)]
fn quantity(value: Option<&serde_json::Value>) -> u32 {
    let count = match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.ceil() as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    count
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(1)
        .max(1)
}
