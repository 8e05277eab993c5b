//! Payment provider errors.

use thiserror::Error;

/// Errors that can occur when interacting with Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe returned an error. Displays Stripe's `error.message`.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The checkout session id is not a Stripe session id.
    #[error("Invalid checkout session id: {0}")]
    InvalidId(String),

    /// Invalid webhook signature.
    #[error("Invalid Stripe signature: {0}")]
    InvalidSignature(String),
}
