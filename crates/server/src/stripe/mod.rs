//! Stripe integration for checkout and the product catalog.
//!
//! Provides:
//! - [`PaymentProvider`], the seam the billing service depends on
//! - [`StripeClient`], the REST implementation (form-encoded, bearer key)
//! - [`webhook`] signature verification for incoming events

mod client;
mod error;
mod types;
pub mod webhook;

use async_trait::async_trait;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{
    CheckoutRequest, CheckoutSession, CustomerDetails, Event, EventData, PriceRef, Recurring,
    StripePrice, StripeProduct,
};

/// Operations on the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, StripeError>;

    /// Fetch a checkout session by id.
    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, StripeError>;

    /// Every active product, with its default price expanded.
    async fn list_active_products(&self) -> Result<Vec<StripeProduct>, StripeError>;
}
