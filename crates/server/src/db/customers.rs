//! Database operations for clients and leads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clientdesk_core::{AuthUserId, ClientId, LeadId, LeadStatus, SellerId, SubscriptionStatus};

use super::{ClientStore, LeadStore, PgStore, RepositoryError, email_from_row};
use crate::models::{Client, Lead};

// =============================================================================
// Clients
// =============================================================================

const CLIENT_COLUMNS: &str = "id, user_id, company_name, contact_name, email, phone, seller_id, \
     employee_count, subscription_status, stripe_customer_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: Uuid,
    user_id: Option<Uuid>,
    company_name: String,
    contact_name: String,
    email: String,
    phone: Option<String>,
    seller_id: Option<Uuid>,
    employee_count: Option<i32>,
    subscription_status: SubscriptionStatus,
    stripe_customer_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = RepositoryError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::new(row.id),
            user_id: row.user_id.map(AuthUserId::new),
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: email_from_row(&row.email)?,
            phone: row.phone,
            seller_id: row.seller_id.map(SellerId::new),
            employee_count: row.employee_count,
            subscription_status: row.subscription_status,
            stripe_customer_id: row.stripe_customer_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_client_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_clients(
        &self,
        seller: Option<SellerId>,
    ) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            r"
            SELECT {CLIENT_COLUMNS} FROM clients
            WHERE $1::uuid IS NULL OR seller_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(seller.map(|s| s.as_uuid()))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_subscription_status(
        &self,
        id: ClientId,
        status: SubscriptionStatus,
        stripe_customer_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE clients
            SET subscription_status = $1,
                stripe_customer_id = COALESCE($2, stripe_customer_id)
            WHERE id = $3
            ",
        )
        .bind(status)
        .bind(stripe_customer_id)
        .bind(id.as_uuid())
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn set_status_by_stripe_customer(
        &self,
        stripe_customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE clients SET subscription_status = $1 WHERE stripe_customer_id = $2",
        )
        .bind(status)
        .bind(stripe_customer_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Leads
// =============================================================================

const LEAD_COLUMNS: &str =
    "id, user_id, company_name, contact_name, email, phone, seller_id, status, notes, created_at";

#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    user_id: Option<Uuid>,
    company_name: String,
    contact_name: String,
    email: String,
    phone: Option<String>,
    seller_id: Option<Uuid>,
    status: LeadStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = RepositoryError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::new(row.id),
            user_id: row.user_id.map(AuthUserId::new),
            company_name: row.company_name,
            contact_name: row.contact_name,
            email: email_from_row(&row.email)?,
            phone: row.phone,
            seller_id: row.seller_id.map(SellerId::new),
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_lead_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_leads(&self, seller: Option<SellerId>) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query_as::<_, LeadRow>(&format!(
            r"
            SELECT {LEAD_COLUMNS} FROM leads
            WHERE $1::uuid IS NULL OR seller_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(seller.map(|s| s.as_uuid()))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "UPDATE leads SET status = $1 WHERE id = $2 RETURNING {LEAD_COLUMNS}"
        ))
        .bind(status)
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn assign_lead(
        &self,
        id: LeadId,
        seller: Option<SellerId>,
    ) -> Result<Lead, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(&format!(
            "UPDATE leads SET seller_id = $1 WHERE id = $2 RETURNING {LEAD_COLUMNS}"
        ))
        .bind(seller.map(|s| s.as_uuid()))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
