//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::services::{ChatFeed, EmailService};
use crate::stripe::PaymentProvider;
use crate::supabase::AuthBackend;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthBackend>,
    payments: Option<Arc<dyn PaymentProvider>>,
    email: Option<EmailService>,
    chat_feed: ChatFeed,
}

/// Builder for [`AppState`]. Stripe and SMTP are optional.
pub struct AppStateBuilder {
    config: ServerConfig,
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthBackend>,
    payments: Option<Arc<dyn PaymentProvider>>,
    email: Option<EmailService>,
    chat_feed: ChatFeed,
}

impl AppStateBuilder {
    #[must_use]
    pub fn payments(mut self, payments: Option<Arc<dyn PaymentProvider>>) -> Self {
        self.payments = payments;
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<EmailService>) -> Self {
        self.email = email;
        self
    }

    /// Use an existing feed, e.g. one whose listener is already running.
    #[must_use]
    pub fn chat_feed(mut self, feed: ChatFeed) -> Self {
        self.chat_feed = feed;
        self
    }

    #[must_use]
    pub fn build(self) -> AppState {
        AppState {
            inner: Arc::new(AppStateInner {
                config: self.config,
                store: self.store,
                auth: self.auth,
                payments: self.payments,
                email: self.email,
                chat_feed: self.chat_feed,
            }),
        }
    }
}

impl AppState {
    /// Start building state around the two required backends.
    #[must_use]
    pub fn builder(
        config: ServerConfig,
        store: Arc<dyn Store>,
        auth: Arc<dyn AuthBackend>,
    ) -> AppStateBuilder {
        AppStateBuilder {
            config,
            store,
            auth,
            payments: None,
            email: None,
            chat_feed: ChatFeed::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Shared handle to the store, for spawned tasks.
    #[must_use]
    pub fn store_handle(&self) -> Arc<dyn Store> {
        Arc::clone(&self.inner.store)
    }

    #[must_use]
    pub fn auth(&self) -> &dyn AuthBackend {
        self.inner.auth.as_ref()
    }

    /// The payment provider, `None` when Stripe is not configured.
    #[must_use]
    pub fn payments(&self) -> Option<&dyn PaymentProvider> {
        self.inner.payments.as_deref()
    }

    /// The mailer, `None` when SMTP is not configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    #[must_use]
    pub fn chat_feed(&self) -> &ChatFeed {
        &self.inner.chat_feed
    }
}
