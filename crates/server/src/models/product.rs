//! Catalog entries mirrored from the payment provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clientdesk_core::{Money, ProductId};

/// A product and its default price, as last synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub stripe_product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub stripe_price_id: Option<String>,
    /// Price in minor units.
    pub unit_amount: Option<i64>,
    pub currency: Option<String>,
    /// `month`, `year`, ... for recurring prices.
    pub recurring_interval: Option<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// A product as read from the payment provider, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSync {
    pub stripe_product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub stripe_price_id: Option<String>,
    pub unit_amount: Option<i64>,
    pub currency: Option<String>,
    pub recurring_interval: Option<String>,
    pub active: bool,
}

impl Product {
    /// The default price, when the product has one with an amount.
    #[must_use]
    pub fn price(&self) -> Option<Money> {
        match (self.unit_amount, self.currency.as_deref()) {
            (Some(amount), Some(currency)) => Some(Money::new(amount, currency)),
            _ => None,
        }
    }

    /// Human readable price, e.g. `$49.00 / month`.
    #[must_use]
    pub fn price_label(&self) -> String {
        match (self.price(), self.recurring_interval.as_deref()) {
            (Some(price), Some(interval)) => format!("{price} / {interval}"),
            (Some(price), None) => price.to_string(),
            (None, _) => "-".to_string(),
        }
    }
}
