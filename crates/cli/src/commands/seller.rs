//! Seller management commands.

use rust_decimal::Decimal;

use clientdesk_server::services::SellerService;
use clientdesk_server::services::sellers::{CreateSellerInput, DeleteSellerInput};

use super::{CommandError, Context};

/// Create a seller: auth user first, then the seller row.
///
/// # Errors
///
/// Returns an error for missing configuration, invalid input or upstream
/// failures. A failed row insert removes the auth user again.
pub async fn create(
    email: String,
    name: String,
    password: String,
    phone: Option<String>,
    commission: Option<Decimal>,
) -> Result<(), CommandError> {
    let context = Context::load().await?;
    let service = SellerService::new(&context.auth, &context.store);

    let created = service
        .create(CreateSellerInput {
            email: Some(email),
            password: Some(password),
            full_name: Some(name),
            phone,
            commission_rate: commission,
        })
        .await?;

    tracing::info!(
        "Seller created successfully! ID: {}, Email: {}",
        created.seller_id,
        created.email
    );
    Ok(())
}

/// Delete a seller and its auth user.
///
/// # Errors
///
/// Returns an error if the seller does not exist or an upstream call fails.
pub async fn delete(seller_id: String) -> Result<(), CommandError> {
    let context = Context::load().await?;
    let service = SellerService::new(&context.auth, &context.store);

    let done = service
        .delete(DeleteSellerInput {
            seller_id: Some(seller_id),
        })
        .await?;

    tracing::info!("{}", done.message);
    Ok(())
}
