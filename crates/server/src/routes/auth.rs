//! Login and logout.
//!
//! The portal login shows a freshly shuffled keypad on every render. The
//! layout is kept in the session and the form submits only the pressed
//! button positions, which are decoded back into the access code here.
//! The console login is a plain email/password form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use clientdesk_core::{AuthUserId, Email, KeypadLayout, PIN_LENGTH, PortalRole};

use crate::db::{ClientStore, LeadStore, SellerStore};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_session, set_console_user, set_portal_user};
use crate::models::{ConsoleAccess, ConsoleUser, PortalUser, session_keys};
use crate::state::AppState;
use crate::supabase::{AuthUser, SupabaseError};

// =============================================================================
// Form Types
// =============================================================================

/// Portal login form: the email and the pressed keypad positions.
#[derive(Debug, Deserialize)]
pub struct PortalLoginForm {
    pub email: String,
    /// Comma-separated button positions, e.g. `4,0,9,9,2,7`.
    #[serde(default)]
    pub positions: String,
}

/// Console login form.
#[derive(Debug, Deserialize)]
pub struct ConsoleLoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Portal login page with the shuffled keypad.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct PortalLoginTemplate {
    pub error: Option<&'static str>,
    pub digits: Vec<u8>,
    pub pin_length: usize,
}

/// Console login page.
#[derive(Template, WebTemplate)]
#[template(path = "console_login.html")]
pub struct ConsoleLoginTemplate {
    pub error: Option<&'static str>,
}

/// User-facing text for a login error code.
fn error_message(code: Option<&str>) -> Option<&'static str> {
    let message = match code? {
        "credentials" => "Email or access code is incorrect.",
        "incomplete" => "Enter all digits of your access code.",
        "expired" => "The keypad expired. Please try again.",
        "no_account" => "No portal account is linked to this login.",
        "not_staff" => "This account has no console access.",
        "password" => "Email or password is incorrect.",
        _ => "Login failed. Please try again.",
    };
    Some(message)
}

// =============================================================================
// Portal Login
// =============================================================================

/// GET /login
pub async fn portal_login_page(
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<PortalLoginTemplate, AppError> {
    let layout = KeypadLayout::shuffled(&mut rand::rng());
    session.insert(session_keys::KEYPAD_LAYOUT, &layout).await?;

    Ok(PortalLoginTemplate {
        error: error_message(query.error.as_deref()),
        digits: layout.digits().to_vec(),
        pin_length: PIN_LENGTH,
    })
}

fn portal_error(code: &str) -> Response {
    Redirect::to(&format!("/login?error={code}")).into_response()
}

/// POST /login
pub async fn portal_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PortalLoginForm>,
) -> Result<Response, AppError> {
    // A layout decodes one submission only.
    let Some(layout) = session
        .remove::<KeypadLayout>(session_keys::KEYPAD_LAYOUT)
        .await?
    else {
        return Ok(portal_error("expired"));
    };

    let positions: Result<Vec<usize>, _> = form
        .positions
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse::<usize>)
        .collect();
    let Ok(entry) = positions
        .map_err(|_| ())
        .and_then(|p| layout.decode(p).map_err(|_| ()))
    else {
        return Ok(portal_error("incomplete"));
    };
    if !entry.is_complete() {
        return Ok(portal_error("incomplete"));
    }

    let Ok(email) = Email::parse(&form.email) else {
        return Ok(portal_error("credentials"));
    };

    let auth_user = match state
        .auth()
        .sign_in_with_password(&email, &SecretString::from(entry.as_str().to_string()))
        .await
    {
        Ok(auth_session) => auth_session.user,
        Err(SupabaseError::InvalidCredentials) => {
            warn!(email = %email, "Portal login refused");
            return Ok(portal_error("credentials"));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(user) = portal_user(&state, auth_user.id, email).await? else {
        warn!(user_id = %auth_user.id, "Portal login without client or lead record");
        return Ok(portal_error("no_account"));
    };

    session.cycle_id().await?;
    set_portal_user(&session, &user).await?;
    set_sentry_user(&user.user_id, Some(user.email.as_str()));
    info!(user_id = %user.user_id, role = ?user.role, "Portal login");

    Ok(Redirect::to("/portal").into_response())
}

/// The client or lead behind an auth user; clients win.
async fn portal_user(
    state: &AppState,
    user_id: AuthUserId,
    email: Email,
) -> Result<Option<PortalUser>, AppError> {
    if let Some(client) = state.store().get_client_by_user(user_id).await? {
        return Ok(Some(PortalUser {
            user_id,
            email,
            display_name: client.contact_name,
            role: PortalRole::Client,
            client_id: Some(client.id),
            lead_id: None,
        }));
    }
    if let Some(lead) = state.store().get_lead_by_user(user_id).await? {
        return Ok(Some(PortalUser {
            user_id,
            email,
            display_name: lead.contact_name,
            role: PortalRole::Lead,
            client_id: None,
            lead_id: Some(lead.id),
        }));
    }
    Ok(None)
}

// =============================================================================
// Console Login
// =============================================================================

/// GET /console/login
pub async fn console_login_page(Query(query): Query<MessageQuery>) -> ConsoleLoginTemplate {
    ConsoleLoginTemplate {
        error: error_message(query.error.as_deref()),
    }
}

fn console_error(code: &str) -> Response {
    Redirect::to(&format!("/console/login?error={code}")).into_response()
}

/// POST /console/login
pub async fn console_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ConsoleLoginForm>,
) -> Result<Response, AppError> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(console_error("password"));
    };

    let auth_user = match state
        .auth()
        .sign_in_with_password(&email, &SecretString::from(form.password))
        .await
    {
        Ok(auth_session) => auth_session.user,
        Err(SupabaseError::InvalidCredentials) => {
            warn!(email = %email, "Console login refused");
            return Ok(console_error("password"));
        }
        Err(e) => return Err(e.into()),
    };

    let Some(user) = console_user(&state, &auth_user, email).await? else {
        warn!(user_id = %auth_user.id, "Console login without seller or admin role");
        return Ok(console_error("not_staff"));
    };

    session.cycle_id().await?;
    set_console_user(&session, &user).await?;
    set_sentry_user(&user.user_id, Some(user.email.as_str()));
    info!(user_id = %user.user_id, role = %user.role(), "Console login");

    Ok(Redirect::to("/console").into_response())
}

/// Admins are marked by `role: "admin"` in the auth user's metadata and may
/// also own a seller row; everyone else needs an active seller row.
async fn console_user(
    state: &AppState,
    auth_user: &AuthUser,
    email: Email,
) -> Result<Option<ConsoleUser>, AppError> {
    let seller = state.store().get_seller_by_user(auth_user.id).await?;
    let is_admin = auth_user.user_metadata.get("role").and_then(|r| r.as_str()) == Some("admin");

    let (access, display_name) = match seller {
        _ if is_admin => {
            let name = auth_user
                .full_name()
                .map(String::from)
                .or_else(|| seller.as_ref().map(|s| s.full_name.clone()))
                .unwrap_or_else(|| email.to_string());
            (
                ConsoleAccess::Admin {
                    seller_id: seller.as_ref().map(|s| s.id),
                },
                name,
            )
        }
        Some(seller) if seller.is_active => (
            ConsoleAccess::Seller {
                seller_id: seller.id,
            },
            seller.full_name,
        ),
        _ => return Ok(None),
    };

    Ok(Some(ConsoleUser {
        user_id: auth_user.id,
        email,
        display_name,
        access,
    }))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_session(&session).await {
        warn!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();
    Redirect::to("/login")
}
