//! Authentication extractors for the portal and the console.
//!
//! Page requests without a login are redirected to the matching login page;
//! requests under `/api/` get a bare 401 instead.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{ConsoleUser, PortalUser, session_keys};
use crate::services::Participant;

/// Portal login page.
pub const PORTAL_LOGIN_PATH: &str = "/login";

/// Console login page.
pub const CONSOLE_LOGIN_PATH: &str = "/console/login";

/// Error returned when a login is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to a login page (for HTML requests).
    RedirectToLogin(&'static str),
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Logged in, but not allowed here.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(path) => Redirect::to(path).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only admins can access this resource",
            )
                .into_response(),
        }
    }
}

fn missing_login(parts: &Parts, login_path: &'static str) -> AuthRejection {
    // Nested routers see a stripped path; the original one is in extensions.
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |OriginalUri(uri)| uri.path());
    if path.starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin(login_path)
    }
}

async fn session_value<T>(parts: &Parts, key: &str) -> Option<T>
where
    T: serde::de::DeserializeOwned,
{
    let session = parts.extensions.get::<Session>()?;
    session.get::<T>(key).await.ok().flatten()
}

/// Extractor that requires a portal (client or lead) login.
pub struct RequirePortalUser(pub PortalUser);

impl<S> FromRequestParts<S> for RequirePortalUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_value(parts, session_keys::PORTAL_USER)
            .await
            .map(Self)
            .ok_or_else(|| missing_login(parts, PORTAL_LOGIN_PATH))
    }
}

/// Extractor that requires a console (seller or admin) login.
pub struct RequireConsoleUser(pub ConsoleUser);

impl<S> FromRequestParts<S> for RequireConsoleUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_value(parts, session_keys::CONSOLE_USER)
            .await
            .map(Self)
            .ok_or_else(|| missing_login(parts, CONSOLE_LOGIN_PATH))
    }
}

/// Extractor that requires a console login with admin access.
///
/// Not logged in behaves like [`RequireConsoleUser`]; a seller gets 403.
pub struct RequireAdmin(pub ConsoleUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireConsoleUser(user) = RequireConsoleUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Whoever is logged in, console first.
#[derive(Debug, Clone)]
pub enum SessionUser {
    Portal(PortalUser),
    Console(ConsoleUser),
}

impl SessionUser {
    /// This user as a chat participant.
    #[must_use]
    pub const fn participant(&self) -> Participant<'_> {
        match self {
            Self::Portal(user) => Participant::Portal(user),
            Self::Console(user) => Participant::Console(user),
        }
    }
}

/// Extractor that requires either login. Used by the chat API.
pub struct RequireAnyUser(pub SessionUser);

impl<S> FromRequestParts<S> for RequireAnyUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = session_value(parts, session_keys::CONSOLE_USER).await {
            return Ok(Self(SessionUser::Console(user)));
        }
        if let Some(user) = session_value(parts, session_keys::PORTAL_USER).await {
            return Ok(Self(SessionUser::Portal(user)));
        }
        Err(missing_login(parts, PORTAL_LOGIN_PATH))
    }
}

/// Store the portal user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_portal_user(
    session: &Session,
    user: &PortalUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::PORTAL_USER, user).await
}

/// Store the console user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_console_user(
    session: &Session,
    user: &ConsoleUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CONSOLE_USER, user).await
}

/// End both logins.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
