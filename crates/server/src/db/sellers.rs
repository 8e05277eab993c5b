//! Database operations for sellers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use clientdesk_core::{AuthUserId, SellerId};

use super::{PgStore, RepositoryError, SellerStore, email_from_row};
use crate::models::{NewSeller, Seller};

const SELLER_COLUMNS: &str =
    "id, user_id, email, full_name, phone, commission_rate, is_active, created_at";

#[derive(Debug, sqlx::FromRow)]
struct SellerRow {
    id: Uuid,
    user_id: Uuid,
    email: String,
    full_name: String,
    phone: Option<String>,
    commission_rate: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SellerRow> for Seller {
    type Error = RepositoryError;

    fn try_from(row: SellerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SellerId::new(row.id),
            user_id: AuthUserId::new(row.user_id),
            email: email_from_row(&row.email)?,
            full_name: row.full_name,
            phone: row.phone,
            commission_rate: row.commission_rate,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl SellerStore for PgStore {
    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            r"
            INSERT INTO sellers (user_id, email, full_name, phone, commission_rate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SELLER_COLUMNS}
            "
        ))
        .bind(seller.user_id.as_uuid())
        .bind(seller.email.as_str())
        .bind(&seller.full_name)
        .bind(seller.phone.as_deref())
        .bind(seller.commission_rate)
        .fetch_one(self.pool())
        .await
        .map_err(RepositoryError::from_insert)?;

        row.try_into()
    }

    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_seller_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_sellers(&self) -> Result<Vec<Seller>, RepositoryError> {
        let rows = sqlx::query_as::<_, SellerRow>(&format!(
            "SELECT {SELLER_COLUMNS} FROM sellers ORDER BY full_name"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_seller(&self, id: SellerId) -> Result<Seller, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        for table in ["clients", "leads", "chat_messages"] {
            sqlx::query(&format!(
                "UPDATE {table} SET seller_id = NULL WHERE seller_id = $1"
            ))
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM email_signatures WHERE seller_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, SellerRow>(&format!(
            "DELETE FROM sellers WHERE id = $1 RETURNING {SELLER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls back the detach updates.
        let row = row.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        row.try_into()
    }
}
