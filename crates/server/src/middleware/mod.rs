//! HTTP middleware for the server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Per-route: login rate limiting, function API key, CORS

pub mod api_key;
pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use api_key::require_functions_key;
pub use auth::{
    AuthRejection, RequireAdmin, RequireAnyUser, RequireConsoleUser, RequirePortalUser,
    SessionUser, clear_session, set_console_user, set_portal_user,
};
pub use rate_limit::{RateLimiterLayer, login_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, postgres_store};
