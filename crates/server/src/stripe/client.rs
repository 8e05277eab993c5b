//! Stripe REST client.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};
use url::Url;

use super::PaymentProvider;
use super::error::StripeError;
use super::types::{CheckoutRequest, CheckoutSession, ErrorBody, List, StripeProduct};

/// Stripe API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Products requested per list page (Stripe's maximum).
const PAGE_SIZE: &str = "100";

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    base_url: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: STRIPE_API_BASE.to_string(),
        }
    }

    /// URL of one checkout session. The id becomes a single encoded path
    /// segment and must look like a Stripe session id.
    fn session_url(&self, id: &str) -> Result<Url, StripeError> {
        if !is_session_id(id) {
            return Err(StripeError::InvalidId(id.to_string()));
        }
        let mut url =
            Url::parse(&self.base_url).map_err(|e| StripeError::Request(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| StripeError::Request("Stripe base URL cannot hold a path".to_string()))?
            .extend(["checkout", "sessions", id]);
        Ok(url)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, StripeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe returned HTTP {status}"));
            error!(status = %status, error = %message, "Stripe API error");
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| StripeError::Response(e.to_string()))
    }
}

/// `cs_` followed by letters, digits and underscores.
fn is_session_id(id: &str) -> bool {
    id.strip_prefix("cs_").is_some_and(|rest| {
        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    })
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, request), fields(price_id = %request.price_id, quantity = request.quantity))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&request.form_params())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let session: CheckoutSession = Self::parse(response).await?;
        debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(self.session_url(id)?)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        Self::parse(response).await
    }

    #[instrument(skip(self))]
    async fn list_active_products(&self) -> Result<Vec<StripeProduct>, StripeError> {
        let mut products = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![
                ("active", "true".to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("expand[]", "data.default_price".to_string()),
            ];
            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let response = self
                .client
                .get(format!("{}/products", self.base_url))
                .bearer_auth(self.secret_key.expose_secret())
                .query(&query)
                .send()
                .await
                .map_err(|e| StripeError::Request(e.to_string()))?;

            let page: List<StripeProduct> = Self::parse(response).await?;
            starting_after = page.data.last().map(|p| p.id.clone());
            products.extend(page.data);

            if !page.has_more || starting_after.is_none() {
                break;
            }
        }

        debug!(count = products.len(), "Fetched active products");
        Ok(products)
    }
}
