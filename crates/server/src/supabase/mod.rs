//! Supabase auth (GoTrue) integration.
//!
//! Provides:
//! - [`AuthBackend`], the seam handlers and services depend on
//! - [`SupabaseClient`], the REST implementation
//! - [`SupabaseError`] carrying the provider's own error messages

mod client;
mod error;
mod types;

use async_trait::async_trait;
use secrecy::SecretString;

use clientdesk_core::{AuthUserId, Email};

pub use client::SupabaseClient;
pub use error::SupabaseError;
pub use types::{AuthSession, AuthUser, CreateUserRequest};

/// Operations on the managed auth backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Create a user with a pre-confirmed email.
    async fn create_user(
        &self,
        email: &Email,
        password: &SecretString,
        metadata: serde_json::Value,
    ) -> Result<AuthUser, SupabaseError>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::UserNotFound`] if the user does not exist.
    async fn delete_user(&self, id: AuthUserId) -> Result<(), SupabaseError>;

    /// Find a user by email, ignoring case.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<AuthUser>, SupabaseError>;

    /// Exchange an email/password pair for a session.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::InvalidCredentials`] when the pair is refused.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError>;
}
