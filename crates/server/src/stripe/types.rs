//! Stripe REST request and response types.

use std::collections::HashMap;

use serde::Deserialize;

use crate::config::CheckoutMode;
use crate::models::ProductSync;

/// Parameters of a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub quantity: u32,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
    /// Our client id, echoed back on the session and in webhooks.
    pub client_reference_id: Option<String>,
    pub customer_email: Option<String>,
}

impl CheckoutRequest {
    /// Form-encoded body of `POST /v1/checkout/sessions`.
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), self.mode.as_str().to_string()),
            ("line_items[0][price]".to_string(), self.price_id.clone()),
            (
                "line_items[0][quantity]".to_string(),
                self.quantity.to_string(),
            ),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        if let Some(client_id) = &self.client_reference_id {
            params.push(("client_reference_id".to_string(), client_id.clone()));
            params.push(("metadata[client_id]".to_string(), client_id.clone()));
        }
        if let Some(email) = &self.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }
        params
    }
}

/// A checkout session as returned by Stripe.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }

    /// Email entered at checkout, falling back to the prefilled one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.as_deref())
            .or(self.customer_email.as_deref())
    }

    /// Our client id, from `client_reference_id` or metadata.
    #[must_use]
    pub fn client_reference(&self) -> Option<&str> {
        self.client_reference_id
            .as_deref()
            .or_else(|| self.metadata.get("client_id").map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

/// A product with its default price expanded.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeProduct {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub default_price: Option<PriceRef>,
}

/// `default_price` is an id unless expanded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceRef {
    Expanded(StripePrice),
    Id(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    pub currency: String,
    #[serde(default)]
    pub recurring: Option<Recurring>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    pub interval: String,
}

impl From<StripeProduct> for ProductSync {
    fn from(product: StripeProduct) -> Self {
        let (price_id, unit_amount, currency, interval) = match product.default_price {
            Some(PriceRef::Expanded(price)) => (
                Some(price.id),
                price.unit_amount,
                Some(price.currency),
                price.recurring.map(|r| r.interval),
            ),
            Some(PriceRef::Id(id)) => (Some(id), None, None, None),
            None => (None, None, None, None),
        };
        Self {
            stripe_product_id: product.id,
            name: product.name,
            description: product.description,
            stripe_price_id: price_id,
            unit_amount,
            currency,
            recurring_interval: interval,
            active: product.active,
        }
    }
}

/// A page of a list endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// Stripe error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// A webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_form_params() {
        let request = CheckoutRequest {
            price_id: "price_123".to_string(),
            quantity: 12,
            mode: CheckoutMode::Subscription,
            success_url: "https://app.test/payment-success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.test/pricing".to_string(),
            client_reference_id: Some("c-1".to_string()),
            customer_email: None,
        };
        let params: HashMap<_, _> = request.form_params().into_iter().collect();
        assert_eq!(params["mode"], "subscription");
        assert_eq!(params["line_items[0][price]"], "price_123");
        assert_eq!(params["line_items[0][quantity]"], "12");
        assert_eq!(params["client_reference_id"], "c-1");
        assert_eq!(params["metadata[client_id]"], "c-1");
        assert!(!params.contains_key("customer_email"));
    }

    #[test]
    fn test_product_with_expanded_price() {
        let json = r#"{
            "id": "prod_1", "name": "Team", "active": true, "description": null,
            "default_price": {
                "id": "price_1", "unit_amount": 4900, "currency": "usd",
                "recurring": {"interval": "month"}
            }
        }"#;
        let sync: ProductSync = serde_json::from_str::<StripeProduct>(json).unwrap().into();
        assert_eq!(sync.stripe_price_id.as_deref(), Some("price_1"));
        assert_eq!(sync.unit_amount, Some(4900));
        assert_eq!(sync.recurring_interval.as_deref(), Some("month"));
    }

    #[test]
    fn test_product_with_unexpanded_price() {
        let json = r#"{"id": "prod_2", "name": "Setup", "active": true, "default_price": "price_9"}"#;
        let sync: ProductSync = serde_json::from_str::<StripeProduct>(json).unwrap().into();
        assert_eq!(sync.stripe_price_id.as_deref(), Some("price_9"));
        assert_eq!(sync.unit_amount, None);
    }

    #[test]
    fn test_session_flags_and_reference() {
        let json = r#"{
            "id": "cs_test_1", "status": "complete", "payment_status": "paid",
            "amount_total": 58800, "currency": "usd",
            "customer_details": {"email": "pay@acme.test"},
            "metadata": {"client_id": "c-9"}
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert!(session.is_paid());
        assert!(session.is_complete());
        assert_eq!(session.email(), Some("pay@acme.test"));
        assert_eq!(session.client_reference(), Some("c-9"));
    }
}
