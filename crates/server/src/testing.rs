//! In-memory stand-ins for the database, the auth backend and the payment
//! provider, plus helpers to build an [`AppState`] around them.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use clientdesk_core::{
    AuthUserId, ChatMessageId, ChatSender, ClientId, Email, LeadId, LeadStatus, PortalRole,
    ProductId, SellerId, SubscriptionStatus,
};

use crate::config::{CheckoutMode, ServerConfig, StripeConfig, SupabaseConfig};
use crate::db::{
    ChatStore, ClientStore, LeadStore, ProductStore, RepositoryError, SellerStore,
    SignatureStore, Store,
};
use crate::models::{
    ChatMessage, Client, ConsoleAccess, ConsoleUser, EmailSignature, Lead, NewChatMessage,
    NewSeller, PortalUser, Product, ProductSync, Seller,
};
use crate::middleware::create_session_layer;
use crate::state::AppState;
use crate::stripe::{
    CheckoutRequest, CheckoutSession, PaymentProvider, PriceRef, StripeError, StripePrice,
    StripeProduct,
};
use crate::supabase::{AuthBackend, AuthSession, AuthUser, SupabaseError};

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct Tables {
    sellers: Vec<Seller>,
    clients: Vec<Client>,
    leads: Vec<Lead>,
    messages: Vec<ChatMessage>,
    signatures: HashMap<SellerId, EmailSignature>,
    products: Vec<Product>,
    fail_seller_inserts: bool,
    clock: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps, so `since` filters are deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }
}

/// Database held in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Make every following `insert_seller` fail.
    pub fn fail_seller_inserts(&self) {
        self.tables.lock().unwrap().fail_seller_inserts = true;
    }

    pub fn add_seller(&self, email: &str) -> Seller {
        self.add_seller_for_user(email, AuthUserId::generate())
    }

    pub fn add_seller_for_user(&self, email: &str, user_id: AuthUserId) -> Seller {
        let mut tables = self.tables.lock().unwrap();
        let seller = Seller {
            id: SellerId::generate(),
            user_id,
            email: Email::parse(email).unwrap(),
            full_name: email.split('@').next().unwrap_or_default().to_string(),
            phone: None,
            commission_rate: rust_decimal::Decimal::TEN,
            is_active: true,
            created_at: tables.now(),
        };
        tables.sellers.push(seller.clone());
        seller
    }

    pub fn add_client(&self, company: &str, seller_id: Option<SellerId>) -> Client {
        self.insert_client(company, seller_id, None)
    }

    pub fn add_client_for_user(&self, company: &str, user_id: AuthUserId) -> Client {
        self.insert_client(company, None, Some(user_id))
    }

    fn insert_client(
        &self,
        company: &str,
        seller_id: Option<SellerId>,
        user_id: Option<AuthUserId>,
    ) -> Client {
        let mut tables = self.tables.lock().unwrap();
        let n = tables.clients.len();
        let client = Client {
            id: ClientId::generate(),
            user_id,
            company_name: company.to_string(),
            contact_name: format!("{company} Owner"),
            email: Email::parse(&format!("owner{n}@{}.test", slug(company))).unwrap(),
            phone: None,
            seller_id,
            employee_count: Some(10),
            subscription_status: SubscriptionStatus::None,
            stripe_customer_id: None,
            created_at: tables.now(),
        };
        tables.clients.push(client.clone());
        client
    }

    pub fn add_lead(&self, company: &str, seller_id: Option<SellerId>) -> Lead {
        self.insert_lead(company, seller_id, None)
    }

    pub fn add_lead_for_user(&self, company: &str, user_id: AuthUserId) -> Lead {
        self.insert_lead(company, None, Some(user_id))
    }

    fn insert_lead(
        &self,
        company: &str,
        seller_id: Option<SellerId>,
        user_id: Option<AuthUserId>,
    ) -> Lead {
        let mut tables = self.tables.lock().unwrap();
        let n = tables.leads.len();
        let lead = Lead {
            id: LeadId::generate(),
            user_id,
            company_name: company.to_string(),
            contact_name: format!("{company} Contact"),
            email: Email::parse(&format!("lead{n}@{}.test", slug(company))).unwrap(),
            phone: None,
            seller_id,
            status: LeadStatus::New,
            notes: None,
            created_at: tables.now(),
        };
        tables.leads.push(lead.clone());
        lead
    }
}

fn slug(company: &str) -> String {
    company
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

#[async_trait]
impl SellerStore for MemoryStore {
    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.fail_seller_inserts {
            return Err(RepositoryError::Conflict(
                "duplicate key value violates unique constraint \"sellers_email_key\"".to_string(),
            ));
        }
        let row = Seller {
            id: SellerId::generate(),
            user_id: seller.user_id,
            email: seller.email,
            full_name: seller.full_name,
            phone: seller.phone,
            commission_rate: seller.commission_rate,
            is_active: true,
            created_at: tables.now(),
        };
        tables.sellers.push(row.clone());
        Ok(row)
    }

    async fn get_seller(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sellers.iter().find(|s| s.id == id).cloned())
    }

    async fn get_seller_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Seller>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.sellers.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn list_sellers(&self) -> Result<Vec<Seller>, RepositoryError> {
        let mut sellers = self.tables.lock().unwrap().sellers.clone();
        sellers.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(sellers)
    }

    async fn delete_seller(&self, id: SellerId) -> Result<Seller, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let index = tables
            .sellers
            .iter()
            .position(|s| s.id == id)
            .ok_or(RepositoryError::NotFound)?;

        for client in tables.clients.iter_mut().filter(|c| c.seller_id == Some(id)) {
            client.seller_id = None;
        }
        for lead in tables.leads.iter_mut().filter(|l| l.seller_id == Some(id)) {
            lead.seller_id = None;
        }
        for message in tables.messages.iter_mut().filter(|m| m.seller_id == Some(id)) {
            message.seller_id = None;
        }
        tables.signatures.remove(&id);

        Ok(tables.sellers.remove(index))
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn get_client_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Client>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .iter()
            .find(|c| c.user_id == Some(user_id))
            .cloned())
    }

    async fn list_clients(
        &self,
        seller: Option<SellerId>,
    ) -> Result<Vec<Client>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .iter()
            .rev()
            .filter(|c| seller.is_none() || c.seller_id == seller)
            .cloned()
            .collect())
    }

    async fn set_subscription_status(
        &self,
        id: ClientId,
        status: SubscriptionStatus,
        stripe_customer_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let client = tables
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        client.subscription_status = status;
        if let Some(customer) = stripe_customer_id {
            client.stripe_customer_id = Some(customer.to_string());
        }
        Ok(())
    }

    async fn set_status_by_stripe_customer(
        &self,
        stripe_customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let mut changed = 0;
        for client in tables
            .clients
            .iter_mut()
            .filter(|c| c.stripe_customer_id.as_deref() == Some(stripe_customer_id))
        {
            client.subscription_status = status;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.leads.iter().find(|l| l.id == id).cloned())
    }

    async fn get_lead_by_user(
        &self,
        user_id: AuthUserId,
    ) -> Result<Option<Lead>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .leads
            .iter()
            .find(|l| l.user_id == Some(user_id))
            .cloned())
    }

    async fn list_leads(&self, seller: Option<SellerId>) -> Result<Vec<Lead>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .leads
            .iter()
            .rev()
            .filter(|l| seller.is_none() || l.seller_id == seller)
            .cloned()
            .collect())
    }

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
    ) -> Result<Lead, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let lead = tables
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(RepositoryError::NotFound)?;
        lead.status = status;
        Ok(lead.clone())
    }

    async fn assign_lead(
        &self,
        id: LeadId,
        seller: Option<SellerId>,
    ) -> Result<Lead, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let lead = tables
            .leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(RepositoryError::NotFound)?;
        lead.seller_id = seller;
        Ok(lead.clone())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn list_messages(
        &self,
        client: ClientId,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let matching: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.client_id == client && since.is_none_or(|s| m.created_at > s))
            .cloned()
            .collect();
        let skip = matching
            .len()
            .saturating_sub(usize::try_from(limit).unwrap_or(0));
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn get_message(
        &self,
        id: ChatMessageId,
    ) -> Result<Option<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_message(
        &self,
        message: NewChatMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let row = ChatMessage {
            id: ChatMessageId::generate(),
            client_id: message.client_id,
            seller_id: message.seller_id,
            sender: message.sender,
            body: message.body,
            read_at: None,
            created_at: tables.now(),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn mark_read(
        &self,
        client: ClientId,
        reader: ChatSender,
    ) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let now = tables.now();
        let mut changed = 0;
        for message in tables.messages.iter_mut().filter(|m| {
            m.client_id == client && m.sender == reader.other() && m.read_at.is_none()
        }) {
            message.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(
        &self,
        client: ClientId,
        reader: ChatSender,
    ) -> Result<i64, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let count = tables
            .messages
            .iter()
            .filter(|m| m.client_id == client && m.sender == reader.other() && m.read_at.is_none())
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl SignatureStore for MemoryStore {
    async fn get_signature(
        &self,
        seller: SellerId,
    ) -> Result<Option<EmailSignature>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.signatures.get(&seller).cloned())
    }

    async fn upsert_signature(
        &self,
        seller: SellerId,
        html: &str,
    ) -> Result<EmailSignature, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let signature = EmailSignature {
            seller_id: seller,
            html: html.to_string(),
            updated_at: tables.now(),
        };
        tables.signatures.insert(seller, signature.clone());
        Ok(signature)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn upsert_products(
        &self,
        products: Vec<ProductSync>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let mut stored = Vec::with_capacity(products.len());
        for product in products {
            let updated_at = tables.now();
            let id = tables
                .products
                .iter()
                .find(|p| p.stripe_product_id == product.stripe_product_id)
                .map_or_else(ProductId::generate, |p| p.id);
            let row = Product {
                id,
                stripe_product_id: product.stripe_product_id,
                name: product.name,
                description: product.description,
                stripe_price_id: product.stripe_price_id,
                unit_amount: product.unit_amount,
                currency: product.currency,
                recurring_interval: product.recurring_interval,
                active: product.active,
                updated_at,
            };
            tables.products.retain(|p| p.id != id);
            tables.products.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .filter(|p| p.active || !active_only)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// =============================================================================
// Auth backend
// =============================================================================

/// Auth backend holding users and their passwords in memory.
#[derive(Default)]
pub struct FakeAuth {
    users: Mutex<Vec<(AuthUser, String)>>,
}

impl FakeAuth {
    pub fn users(&self) -> Vec<AuthUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    /// Forget every user, as if removed out of band.
    pub fn clear(&self) {
        self.users.lock().unwrap().clear();
    }

    pub fn add_user(&self, email: &str) -> AuthUser {
        self.add_user_with_password(email, "not-used")
    }

    /// Set `user_metadata.role`, as the dashboard does for admins.
    pub fn set_role(&self, id: AuthUserId, role: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some((user, _)) = users.iter_mut().find(|(u, _)| u.id == id) {
            user.user_metadata = serde_json::json!({ "role": role });
        }
    }

    pub fn add_user_with_password(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: AuthUserId::generate(),
            email: Some(email.to_string()),
            user_metadata: serde_json::Value::Null,
            created_at: Some(Utc::now()),
        };
        self.users
            .lock()
            .unwrap()
            .push((user.clone(), password.to_string()));
        user
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn create_user(
        &self,
        email: &Email,
        password: &SecretString,
        metadata: serde_json::Value,
    ) -> Result<AuthUser, SupabaseError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(u, _)| u.has_email(email.as_str())) {
            return Err(SupabaseError::Api {
                status: 422,
                message: "A user with this email address has already been registered"
                    .to_string(),
            });
        }
        let user = AuthUser {
            id: AuthUserId::generate(),
            email: Some(email.to_string()),
            user_metadata: metadata,
            created_at: Some(Utc::now()),
        };
        users.push((user.clone(), password.expose_secret().to_string()));
        Ok(user)
    }

    async fn delete_user(&self, id: AuthUserId) -> Result<(), SupabaseError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|(u, _)| u.id != id);
        if users.len() == before {
            return Err(SupabaseError::UserNotFound);
        }
        Ok(())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|(u, _)| u.has_email(email.as_str()))
            .map(|(u, _)| u.clone()))
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|(u, p)| u.has_email(email.as_str()) && p == password.expose_secret())
            .map(|(u, _)| AuthSession {
                access_token: "test-access-token".to_string(),
                refresh_token: None,
                expires_in: Some(3600),
                user: u.clone(),
            })
            .ok_or(SupabaseError::InvalidCredentials)
    }
}

// =============================================================================
// Payment provider
// =============================================================================

/// Payment provider recording checkout requests.
#[derive(Default)]
pub struct FakePayments {
    requests: Mutex<Vec<CheckoutRequest>>,
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    products: Mutex<Vec<StripeProduct>>,
    failure: Mutex<Option<String>>,
}

impl FakePayments {
    pub fn checkout_requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn add_product(&self, id: &str, name: &str, unit_amount: Option<i64>) {
        self.products.lock().unwrap().push(StripeProduct {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            active: true,
            default_price: Some(PriceRef::Expanded(StripePrice {
                id: format!("price_{id}"),
                unit_amount,
                currency: "usd".to_string(),
                recurring: None,
            })),
        });
    }

    pub fn add_session(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    fn check_failure(&self) -> Result<(), StripeError> {
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(StripeError::Api {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, StripeError> {
        self.check_failure()?;
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.stripe.com/c/pay/{id}")),
            status: Some("open".to_string()),
            payment_status: "unpaid".to_string(),
            client_reference_id: request.client_reference_id.clone(),
            id,
            ..Default::default()
        })
    }

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, StripeError> {
        self.check_failure()?;
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StripeError::Api {
                status: 404,
                message: format!("No such checkout.session: '{id}'"),
            })
    }

    async fn list_active_products(&self) -> Result<Vec<StripeProduct>, StripeError> {
        self.check_failure()?;
        Ok(self.products.lock().unwrap().clone())
    }
}

// =============================================================================
// Identities and state
// =============================================================================

pub fn portal_client(client: &Client) -> PortalUser {
    PortalUser {
        user_id: client.user_id.unwrap_or_else(AuthUserId::generate),
        email: client.email.clone(),
        display_name: client.contact_name.clone(),
        role: PortalRole::Client,
        client_id: Some(client.id),
        lead_id: None,
    }
}

pub fn portal_lead(lead: &Lead) -> PortalUser {
    PortalUser {
        user_id: lead.user_id.unwrap_or_else(AuthUserId::generate),
        email: lead.email.clone(),
        display_name: lead.contact_name.clone(),
        role: PortalRole::Lead,
        client_id: None,
        lead_id: Some(lead.id),
    }
}

pub fn console_user(access: ConsoleAccess) -> ConsoleUser {
    ConsoleUser {
        user_id: AuthUserId::generate(),
        email: Email::parse("console@example.com").unwrap(),
        display_name: "Console User".to_string(),
        access,
    }
}

/// Configuration pointing nowhere, with Stripe configured.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/clientdesk_test".to_string()),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "https://desk.example.com".to_string(),
        supabase: SupabaseConfig {
            url: "https://project.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            service_role_key: SecretString::from("service-role".to_string()),
        },
        stripe: Some(StripeConfig {
            secret_key: SecretString::from("sk_test_key".to_string()),
            webhook_secret: Some(SecretString::from("whsec_test_secret".to_string())),
            checkout_mode: CheckoutMode::Subscription,
        }),
        functions_api_key: None,
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
    }
}

/// Fakes behind an [`AppState`], kept so tests can inspect them.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<FakeAuth>,
    pub payments: Arc<FakePayments>,
    pub state: AppState,
    sessions: tower_sessions::MemoryStore,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::default());
        let auth = Arc::new(FakeAuth::default());
        let payments = Arc::new(FakePayments::default());
        let stripe_enabled = config.stripe.is_some();
        let state = AppState::builder(config, store.clone(), auth.clone())
            .payments(stripe_enabled.then(|| payments.clone() as Arc<dyn PaymentProvider>))
            .build();
        Self {
            store,
            auth,
            payments,
            state,
            sessions: tower_sessions::MemoryStore::default(),
        }
    }

    /// The full router without rate limiting. Sessions survive across
    /// calls, so a cookie from one response works on the next request.
    pub fn app(&self) -> axum::Router {
        let session_layer = create_session_layer(self.sessions.clone(), self.state.config());
        crate::app(self.state.clone(), session_layer, None)
    }

    /// Create an active seller with an auth account and log them into the
    /// console. Returns the session cookie and the seller.
    pub async fn login_seller(&self, email: &str) -> (String, Seller) {
        let user = self.auth.add_user_with_password(email, "correct horse");
        let seller = self.store.add_seller_for_user(email, user.id);
        (self.console_login(email).await, seller)
    }

    /// Create an admin auth account and log it into the console.
    pub async fn login_admin(&self, email: &str) -> String {
        let user = self.auth.add_user_with_password(email, "correct horse");
        self.auth.set_role(user.id, "admin");
        self.console_login(email).await
    }

    async fn console_login(&self, email: &str) -> String {
        use tower::ServiceExt;

        let body = format!("email={}&password=correct+horse", email.replace('@', "%40"));
        let response = self
            .app()
            .oneshot(
                axum::http::Request::post("/console/login")
                    .header(
                        axum::http::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(axum::body::Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[axum::http::header::LOCATION],
            "/console",
            "console login failed for {email}"
        );
        response.headers()[axum::http::header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }
}
