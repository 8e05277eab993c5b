//! Business customers: clients (paying) and leads (prospects).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clientdesk_core::{AuthUserId, ClientId, Email, LeadId, LeadStatus, SellerId, SubscriptionStatus};

/// A business customer with portal access and a chat with their seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub user_id: Option<AuthUserId>,
    pub company_name: String,
    pub contact_name: String,
    pub email: Email,
    pub phone: Option<String>,
    /// Assigned seller, cleared when the seller is deleted.
    pub seller_id: Option<SellerId>,
    pub employee_count: Option<i32>,
    pub subscription_status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A prospect in the sales pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub user_id: Option<AuthUserId>,
    pub company_name: String,
    pub contact_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub seller_id: Option<SellerId>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
