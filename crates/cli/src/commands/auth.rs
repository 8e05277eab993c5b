//! Supabase auth user commands.

use clientdesk_server::services::SellerService;
use clientdesk_server::services::sellers::CleanupInput;

use super::{CommandError, Context};

/// Delete the auth user registered under `email`, if any.
///
/// # Errors
///
/// Returns an error for an invalid email or when Supabase fails.
pub async fn cleanup(email: String) -> Result<(), CommandError> {
    let context = Context::load().await?;
    let service = SellerService::new(&context.auth, &context.store);

    let result = service
        .cleanup_auth_user(CleanupInput { email: Some(email) })
        .await?;

    tracing::info!("{}", result.message);
    Ok(())
}
