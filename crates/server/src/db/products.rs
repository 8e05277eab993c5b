//! Database operations for the product catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clientdesk_core::ProductId;

use super::{PgStore, ProductStore, RepositoryError};
use crate::models::{Product, ProductSync};

const PRODUCT_COLUMNS: &str = "id, stripe_product_id, name, description, stripe_price_id, \
     unit_amount, currency, recurring_interval, active, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    stripe_product_id: String,
    name: String,
    description: Option<String>,
    stripe_price_id: Option<String>,
    unit_amount: Option<i64>,
    currency: Option<String>,
    recurring_interval: Option<String>,
    active: bool,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            stripe_product_id: row.stripe_product_id,
            name: row.name,
            description: row.description,
            stripe_price_id: row.stripe_price_id,
            unit_amount: row.unit_amount,
            currency: row.currency,
            recurring_interval: row.recurring_interval,
            active: row.active,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn upsert_products(
        &self,
        products: Vec<ProductSync>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let mut stored = Vec::with_capacity(products.len());

        for product in products {
            let row = sqlx::query_as::<_, ProductRow>(&format!(
                r"
                INSERT INTO products (
                    stripe_product_id, name, description, stripe_price_id,
                    unit_amount, currency, recurring_interval, active
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (stripe_product_id) DO UPDATE
                SET name = EXCLUDED.name,
                    description = EXCLUDED.description,
                    stripe_price_id = EXCLUDED.stripe_price_id,
                    unit_amount = EXCLUDED.unit_amount,
                    currency = EXCLUDED.currency,
                    recurring_interval = EXCLUDED.recurring_interval,
                    active = EXCLUDED.active,
                    updated_at = NOW()
                RETURNING {PRODUCT_COLUMNS}
                "
            ))
            .bind(&product.stripe_product_id)
            .bind(&product.name)
            .bind(product.description.as_deref())
            .bind(product.stripe_price_id.as_deref())
            .bind(product.unit_amount)
            .bind(product.currency.as_deref())
            .bind(product.recurring_interval.as_deref())
            .bind(product.active)
            .fetch_one(&mut *tx)
            .await?;

            stored.push(row.into());
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE active OR NOT $1
            ORDER BY unit_amount NULLS LAST, name
            "
        ))
        .bind(active_only)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
