//! Seller accounts and their email signatures.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use clientdesk_core::{AuthUserId, Email, SellerId};

/// Commission percentage applied when none is given at creation.
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::TEN;

/// An internal sales agent with auth credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: SellerId,
    /// Account in the auth backend.
    pub user_id: AuthUserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    /// Percentage of each sale, e.g. `12.5`.
    pub commission_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a seller row.
#[derive(Debug, Clone)]
pub struct NewSeller {
    pub user_id: AuthUserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub commission_rate: Decimal,
}

/// Stored HTML signature of a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSignature {
    pub seller_id: SellerId,
    pub html: String,
    pub updated_at: DateTime<Utc>,
}
