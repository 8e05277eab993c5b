//! Business logic services.
//!
//! # Services
//!
//! - `billing` - Checkout, product sync and payment verification
//! - `chat` - Conversation access rules and the realtime feed
//! - `email` - Email delivery via SMTP
//! - `sellers` - Seller provisioning against the auth backend
//! - `signature` - Email signature lookup and injection

pub mod billing;
pub mod chat;
pub mod email;
pub mod sellers;
pub mod signature;

pub use billing::BillingService;
pub use chat::{ChatFeed, ChatService, Participant};
pub use email::{EmailError, EmailService, OutgoingEmail};
pub use sellers::SellerService;

/// The trimmed value, unless missing or blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
