//! ClientDesk server - client portal, seller console and function handlers.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for the portal and console pages
//! - Supabase Auth (GoTrue admin API) for user accounts
//! - Stripe for checkout, catalog sync and payment verification
//! - `PostgreSQL` for business data, sessions and chat (`LISTEN/NOTIFY`)
//!
//! # Security
//!
//! Holds the Supabase service-role key and the Stripe secret key. The
//! function endpoints can be locked down with `FUNCTIONS_API_KEY`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clientdesk_server::config::ServerConfig;
use clientdesk_server::db::{self, PgStore, Store};
use clientdesk_server::middleware::{create_session_layer, login_rate_limiter, postgres_store};
use clientdesk_server::services::{ChatFeed, EmailService};
use clientdesk_server::state::AppState;
use clientdesk_server::stripe::{PaymentProvider, StripeClient};
use clientdesk_server::supabase::SupabaseClient;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "clientdesk_server=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p clientdesk-cli -- migrate

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
    let auth = Arc::new(SupabaseClient::new(&config.supabase));

    let payments = config.stripe.as_ref().map(|stripe| {
        Arc::new(StripeClient::new(stripe.secret_key.clone())) as Arc<dyn PaymentProvider>
    });
    if payments.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY not set; checkout and product sync are disabled");
    }

    let email = config.email.as_ref().map(|email| {
        EmailService::new(email).expect("Failed to create SMTP transport")
    });
    if email.is_none() {
        tracing::warn!("SMTP not configured; console email is disabled");
    }

    let chat_feed = ChatFeed::new();
    let _chat_listener = chat_feed.spawn_listener(pool.clone(), store.clone());

    let state = AppState::builder(config.clone(), store, auth)
        .payments(payments)
        .email(email)
        .chat_feed(chat_feed)
        .build();

    let sessions = postgres_store(&pool).expect("Failed to create session store");
    let session_layer = create_session_layer(sessions, &config);

    let app = clientdesk_server::app(state, session_layer, Some(login_rate_limiter()));

    let addr = config.socket_addr();
    if config.functions_api_key.is_some() {
        tracing::info!("Function endpoints require FUNCTIONS_API_KEY");
    }
    tracing::info!("clientdesk listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Peer addresses feed the login rate limiter when no proxy header is set
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
