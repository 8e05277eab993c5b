//! Product catalog commands.

use clientdesk_server::config::CheckoutMode;
use clientdesk_server::services::BillingService;
use clientdesk_server::stripe::PaymentProvider;

use super::{CommandError, Context};

/// Mirror active Stripe products into the products table.
///
/// # Errors
///
/// Returns an error without `STRIPE_SECRET_KEY` or when Stripe or the
/// database fails.
pub async fn sync() -> Result<(), CommandError> {
    let context = Context::load().await?;
    let mode = context
        .config
        .stripe
        .as_ref()
        .map_or(CheckoutMode::Subscription, |s| s.checkout_mode);
    let payments = context
        .payments
        .as_deref()
        .map(|p| p as &dyn PaymentProvider);

    let service = BillingService::new(payments, &context.store, &context.config.base_url, mode);
    let synced = service.sync_products().await?;

    tracing::info!("{}", synced.message);
    for product in &synced.products {
        tracing::info!("  {} ({}): {}", product.name, product.stripe_product_id, product.price_label());
    }
    Ok(())
}
