//! Database migration command.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `CLIENTDESK_MIGRATIONS` - Migration directory (default: `crates/server/migrations`)

use std::path::Path;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use thiserror::Error;

/// Default location of the server migrations, relative to the workspace root.
const DEFAULT_MIGRATIONS_DIR: &str = "crates/server/migrations";

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the migration directory
/// cannot be read, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))?;
    let dir = std::env::var("CLIENTDESK_MIGRATIONS")
        .unwrap_or_else(|_| DEFAULT_MIGRATIONS_DIR.to_string());

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations from {dir}...");
    let migrator = Migrator::new(Path::new(&dir)).await?;
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
