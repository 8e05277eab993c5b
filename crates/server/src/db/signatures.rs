//! Database operations for seller email signatures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clientdesk_core::SellerId;

use super::{PgStore, RepositoryError, SignatureStore};
use crate::models::EmailSignature;

#[derive(Debug, sqlx::FromRow)]
struct SignatureRow {
    seller_id: Uuid,
    html: String,
    updated_at: DateTime<Utc>,
}

impl From<SignatureRow> for EmailSignature {
    fn from(row: SignatureRow) -> Self {
        Self {
            seller_id: SellerId::new(row.seller_id),
            html: row.html,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SignatureStore for PgStore {
    async fn get_signature(
        &self,
        seller: SellerId,
    ) -> Result<Option<EmailSignature>, RepositoryError> {
        let row = sqlx::query_as::<_, SignatureRow>(
            "SELECT seller_id, html, updated_at FROM email_signatures WHERE seller_id = $1",
        )
        .bind(seller.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn upsert_signature(
        &self,
        seller: SellerId,
        html: &str,
    ) -> Result<EmailSignature, RepositoryError> {
        let row = sqlx::query_as::<_, SignatureRow>(
            r"
            INSERT INTO email_signatures (seller_id, html)
            VALUES ($1, $2)
            ON CONFLICT (seller_id) DO UPDATE
            SET html = EXCLUDED.html, updated_at = NOW()
            RETURNING seller_id, html, updated_at
            ",
        )
        .bind(seller.as_uuid())
        .bind(html)
        .fetch_one(self.pool())
        .await?;

        Ok(row.into())
    }
}
