//! CLI command implementations.
//!
//! The management commands drive the same services as the server's
//! function endpoints, against the real database and upstream APIs.

pub mod auth;
pub mod migrate;
pub mod products;
pub mod seller;

use std::sync::Arc;

use thiserror::Error;

use clientdesk_server::config::{ConfigError, ServerConfig};
use clientdesk_server::db::{self, PgStore};
use clientdesk_server::error::ServiceError;
use clientdesk_server::stripe::StripeClient;
use clientdesk_server::supabase::SupabaseClient;

/// Errors shared by the management commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// The service refused or failed the operation.
    #[error("{0}")]
    Service(#[from] ServiceError),
}

/// Connections needed by the management commands.
pub struct Context {
    pub config: ServerConfig,
    pub store: PgStore,
    pub auth: SupabaseClient,
    pub payments: Option<Arc<StripeClient>>,
}

impl Context {
    /// Load configuration from the environment and connect to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or the database is
    /// unreachable.
    pub async fn load() -> Result<Self, CommandError> {
        dotenvy::dotenv().ok();
        let config = ServerConfig::from_env()?;

        tracing::info!("Connecting to database...");
        let pool = db::create_pool(&config.database_url).await?;

        let auth = SupabaseClient::new(&config.supabase);
        let payments = config
            .stripe
            .as_ref()
            .map(|stripe| Arc::new(StripeClient::new(stripe.secret_key.clone())));

        Ok(Self {
            config,
            store: PgStore::new(pool),
            auth,
            payments,
        })
    }
}
