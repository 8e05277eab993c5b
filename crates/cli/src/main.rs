//! ClientDesk CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! cd-cli migrate
//!
//! # Provision a seller (auth user + seller row)
//! cd-cli seller create -e ana@example.com -n "Ana Ruiz" -p 'long-password' --commission 12.5
//!
//! # Remove a seller and its auth user
//! cd-cli seller delete 4f1c...
//!
//! # Mirror the Stripe catalog into the products table
//! cd-cli products sync
//!
//! # Remove an orphaned auth user
//! cd-cli auth cleanup -e someone@example.com
//! ```
//!
//! Every command except `migrate` loads the same environment as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "cd-cli")]
#[command(author, version, about = "ClientDesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage sellers
    Seller {
        #[command(subcommand)]
        action: SellerAction,
    },
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage Supabase auth users
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum SellerAction {
    /// Create a seller with a login
    Create {
        /// Seller email address
        #[arg(short, long)]
        email: String,

        /// Seller full name
        #[arg(short, long)]
        name: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Phone number
        #[arg(long)]
        phone: Option<String>,

        /// Commission rate in percent (default 10)
        #[arg(long)]
        commission: Option<Decimal>,
    },
    /// Delete a seller and its auth user
    Delete {
        /// Seller ID
        seller_id: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Sync active Stripe products and prices
    Sync,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Delete the auth user registered under an email
    Cleanup {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seller { action } => match action {
            SellerAction::Create {
                email,
                name,
                password,
                phone,
                commission,
            } => {
                commands::seller::create(email, name, password, phone, commission).await?;
            }
            SellerAction::Delete { seller_id } => commands::seller::delete(seller_id).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::Sync => commands::products::sync().await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Cleanup { email } => commands::auth::cleanup(email).await?,
        },
    }
    Ok(())
}
