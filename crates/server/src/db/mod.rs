//! Data-access layer over the managed Postgres database.
//!
//! # Tables
//!
//! - `sellers` - Sales agents (one auth user each)
//! - `clients` - Paying business customers
//! - `leads` - Prospects in the pipeline
//! - `chat_messages` - Client/seller conversation history
//! - `email_signatures` - One HTML signature per seller
//! - `products` - Catalog mirrored from Stripe
//! - `portal.session` - tower-sessions storage
//!
//! Each operation is a single query (seller deletion is one transaction).
//! Repositories are expressed as traits so handlers can be exercised against
//! an in-memory store; [`PgStore`] is the production implementation.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p clientdesk-cli -- migrate
//! ```

pub mod chat;
pub mod customers;
pub mod products;
pub mod sellers;
pub mod signatures;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use clientdesk_core::{
    AuthUserId, ChatMessageId, ChatSender, ClientId, LeadId, LeadStatus, SellerId,
    SubscriptionStatus,
};

use crate::models::product::ProductSync;
use crate::models::{
    ChatMessage, Client, EmailSignature, Lead, NewChatMessage, NewSeller, Product, Seller,
};

/// Postgres channel carrying the id of every new chat message.
pub const CHAT_CHANNEL: &str = "chat_messages";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(db_err.message().to_string());
        }
        Self::Database(err)
    }
}

/// Seller rows.
#[async_trait]
pub trait SellerStore: Send + Sync {
    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, RepositoryError>;
    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError>;
    async fn get_seller_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Seller>, RepositoryError>;
    async fn list_sellers(&self) -> Result<Vec<Seller>, RepositoryError>;

    /// Detach the seller from clients, leads and chat messages, then delete
    /// the row. Returns the deleted seller.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such seller exists.
    async fn delete_seller(&self, id: SellerId) -> Result<Seller, RepositoryError>;
}

/// Client rows.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError>;
    async fn get_client_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Client>, RepositoryError>;

    /// Clients, optionally restricted to one seller, newest first.
    async fn list_clients(&self, seller: Option<SellerId>)
    -> Result<Vec<Client>, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such client exists.
    async fn set_subscription_status(
        &self,
        id: ClientId,
        status: SubscriptionStatus,
        stripe_customer_id: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// Set the status of every client billed under a Stripe customer.
    /// Returns how many clients changed.
    async fn set_status_by_stripe_customer(
        &self,
        stripe_customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, RepositoryError>;
}

/// Lead rows.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError>;
    async fn get_lead_by_user(&self, user_id: AuthUserId)
    -> Result<Option<Lead>, RepositoryError>;

    /// Leads, optionally restricted to one seller, newest first.
    async fn list_leads(&self, seller: Option<SellerId>) -> Result<Vec<Lead>, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such lead exists.
    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such lead exists.
    async fn assign_lead(
        &self,
        id: LeadId,
        seller: Option<SellerId>,
    ) -> Result<Lead, RepositoryError>;
}

/// Chat message rows.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Messages of one conversation, oldest first. With `since`, only
    /// messages created strictly after it.
    async fn list_messages(
        &self,
        client: ClientId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    async fn get_message(&self, id: ChatMessageId)
    -> Result<Option<ChatMessage>, RepositoryError>;

    /// Store a message and notify [`CHAT_CHANNEL`] listeners.
    async fn insert_message(&self, message: NewChatMessage)
    -> Result<ChatMessage, RepositoryError>;

    /// Mark every unread message written by the other side as read by
    /// `reader`. Returns how many messages changed.
    async fn mark_read(&self, client: ClientId, reader: ChatSender)
    -> Result<u64, RepositoryError>;

    /// Unread messages waiting for `reader`.
    async fn unread_count(
        &self,
        client: ClientId,
        reader: ChatSender,
    ) -> Result<i64, RepositoryError>;
}

/// Seller email signatures.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn get_signature(
        &self,
        seller: SellerId,
    ) -> Result<Option<EmailSignature>, RepositoryError>;
    async fn upsert_signature(
        &self,
        seller: SellerId,
        html: &str,
    ) -> Result<EmailSignature, RepositoryError>;
}

/// Product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Insert or update products keyed by Stripe product id.
    async fn upsert_products(
        &self,
        products: Vec<ProductSync>,
    ) -> Result<Vec<Product>, RepositoryError>;
    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, RepositoryError>;
}

/// Everything the server needs from the database.
#[async_trait]
pub trait Store:
    SellerStore + ClientStore + LeadStore + ChatStore + SignatureStore + ProductStore
{
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (sessions and the chat listener share it).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Parse an email read from the database.
pub(crate) fn email_from_row(raw: &str) -> Result<clientdesk_core::Email, RepositoryError> {
    clientdesk_core::Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email '{raw}': {e}")))
}
