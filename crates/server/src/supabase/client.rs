//! GoTrue REST client.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use clientdesk_core::{AuthUserId, Email};

use super::AuthBackend;
use super::error::SupabaseError;
use super::types::{AuthSession, AuthUser, CreateUserRequest, UserPage};
use crate::config::SupabaseConfig;

/// Users fetched per page when searching by email.
const USERS_PER_PAGE: usize = 1000;

/// Supabase auth API client.
///
/// Admin calls use the service role key; password sign-in uses the anon key
/// the way a browser client would.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    auth_url: String,
    anon_key: String,
    service_role_key: SecretString,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("auth_url", &self.auth_url)
            .field("service_role_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a new auth client.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            auth_url: format!("{}/auth/v1", config.url),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let key = self.service_role_key.expose_secret();
        self.client
            .request(method, format!("{}{path}", self.auth_url))
            .header("apikey", key)
            .bearer_auth(key)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, SupabaseError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: SupabaseError::message_from_body(status.as_u16(), &body),
            });
        }
        response
            .json()
            .await
            .map_err(|e| SupabaseError::Response(e.to_string()))
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    async fn create_user(
        &self,
        email: &Email,
        password: &SecretString,
        metadata: serde_json::Value,
    ) -> Result<AuthUser, SupabaseError> {
        let body = CreateUserRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
            email_confirm: true,
            user_metadata: metadata,
        };

        let response = self
            .admin(reqwest::Method::POST, "/admin/users")
            .json(&body)
            .send()
            .await
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        let user: AuthUser = Self::parse(response).await?;
        debug!(user_id = %user.id, "Auth user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: AuthUserId) -> Result<(), SupabaseError> {
        let response = self
            .admin(reqwest::Method::DELETE, &format!("/admin/users/{id}"))
            .send()
            .await
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SupabaseError::UserNotFound);
        }
        Self::parse::<serde_json::Value>(response).await?;
        debug!("Auth user deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError> {
        let mut page = 1_usize;
        loop {
            let response = self
                .admin(reqwest::Method::GET, "/admin/users")
                .query(&[("page", page), ("per_page", USERS_PER_PAGE)])
                .send()
                .await
                .map_err(|e| SupabaseError::Request(e.to_string()))?;

            let UserPage { users } = Self::parse(response).await?;
            let count = users.len();
            if let Some(user) = users.into_iter().find(|u| u.has_email(email.as_str())) {
                return Ok(Some(user));
            }
            if count < USERS_PER_PAGE {
                return Ok(None);
            }
            page += 1;
        }
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email.as_str(),
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        if response.status() == StatusCode::BAD_REQUEST {
            warn!("Password grant refused");
            return Err(SupabaseError::InvalidCredentials);
        }
        Self::parse(response).await
    }
}
