//! Email signature lookup and injection.

use askama::Template;

use clientdesk_core::SellerId;

use super::email::{EmailService, OutgoingEmail};
use crate::db::{SellerStore, SignatureStore, Store};
use crate::error::AppError;
use crate::models::{Client, Seller};

/// Marks where a signature should go in a composed body.
pub const PLACEHOLDER: &str = "<!-- signature -->";

/// Class of the wrapper around an injected signature.
const SIGNATURE_CLASS: &str = "email-signature";

/// Signature used when a seller has not stored one.
#[derive(Template)]
#[template(path = "email/default_signature.html")]
struct DefaultSignature<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
}

/// Render the fallback signature for a seller.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn default_signature(seller: &Seller) -> Result<String, askama::Error> {
    DefaultSignature {
        name: &seller.full_name,
        email: seller.email.as_str(),
        phone: seller.phone.as_deref(),
    }
    .render()
}

/// The seller's stored signature, or the default one.
///
/// # Errors
///
/// `NotFound` for an unknown seller; database or template failures.
pub async fn signature_for(store: &dyn Store, seller_id: SellerId) -> Result<String, AppError> {
    if let Some(stored) = store.get_signature(seller_id).await? {
        return Ok(stored.html);
    }
    let seller = store
        .get_seller(seller_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Seller not found".to_string()))?;
    default_signature(&seller).map_err(|e| AppError::Internal(e.to_string()))
}

/// Insert a signature into an HTML body.
///
/// The signature replaces [`PLACEHOLDER`] when present, otherwise goes
/// before the last `</body>`, otherwise is appended after a blank line.
/// A body that already carries a signature block is returned unchanged.
#[must_use]
pub fn inject(body: &str, signature: &str) -> String {
    if body.contains(&format!("class=\"{SIGNATURE_CLASS}\"")) {
        return body.to_string();
    }

    let block = format!("<div class=\"{SIGNATURE_CLASS}\">{signature}</div>");

    if body.contains(PLACEHOLDER) {
        return body.replacen(PLACEHOLDER, &block, 1);
    }

    // ASCII lowercasing keeps byte offsets intact.
    if let Some(pos) = body.to_ascii_lowercase().rfind("</body>") {
        let (head, tail) = body.split_at(pos);
        return format!("{head}{block}{tail}");
    }

    format!("{body}<br><br>{block}")
}

/// Email a client from a seller, signed with the seller's signature.
/// Replies go to the seller.
///
/// # Errors
///
/// `Unavailable` without SMTP; signature lookup or delivery failures.
pub async fn send_email(
    store: &dyn Store,
    mailer: Option<&EmailService>,
    seller: &Seller,
    client: &Client,
    subject: &str,
    html: &str,
) -> Result<(), AppError> {
    let mailer =
        mailer.ok_or_else(|| AppError::Unavailable("Email is not configured".to_string()))?;
    let signature = signature_for(store, seller.id).await?;
    let body = inject(html, &signature);

    mailer
        .send(OutgoingEmail {
            to: client.email.as_str(),
            reply_to: Some((&seller.full_name, seller.email.as_str())),
            subject,
            html: &body,
            text: None,
        })
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::testing::MemoryStore;
    use clientdesk_core::{AuthUserId, Email};

    const SIG: &str = "<p>Ana</p>";

    fn seller(phone: Option<&str>) -> Seller {
        Seller {
            id: SellerId::generate(),
            user_id: AuthUserId::generate(),
            email: Email::parse("ana@example.com").unwrap(),
            full_name: "Ana <Ruiz> & Co".to_string(),
            phone: phone.map(String::from),
            commission_rate: Decimal::TEN,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_replaces_placeholder() {
        let out = inject("<p>Hi</p><!-- signature --><p>PS</p>", SIG);
        assert_eq!(
            out,
            "<p>Hi</p><div class=\"email-signature\"><p>Ana</p></div><p>PS</p>"
        );
    }

    #[test]
    fn test_inserts_before_closing_body() {
        let out = inject("<html><BODY><p>Hi</p></BODY></html>", SIG);
        assert_eq!(
            out,
            "<html><BODY><p>Hi</p><div class=\"email-signature\"><p>Ana</p></div></BODY></html>"
        );
    }

    #[test]
    fn test_appends_to_fragment() {
        let out = inject("<p>Hi</p>", SIG);
        assert_eq!(
            out,
            "<p>Hi</p><br><br><div class=\"email-signature\"><p>Ana</p></div>"
        );
    }

    #[test]
    fn test_injection_is_idempotent() {
        for body in ["<p>Hi</p>", "<body>x</body>", "a <!-- signature --> b"] {
            let once = inject(body, SIG);
            assert_eq!(inject(&once, SIG), once);
        }
    }

    #[test]
    fn test_default_signature_escapes_fields() {
        let html = default_signature(&seller(Some("+1 555 0100"))).unwrap();
        assert!(html.contains("Ana &#60;Ruiz&#62; &#38; Co") || html.contains("Ana &lt;Ruiz&gt; &amp; Co"));
        assert!(html.contains("ana@example.com"));
        assert!(html.contains("+1 555 0100"));
    }

    #[test]
    fn test_default_signature_without_phone() {
        let html = default_signature(&seller(None)).unwrap();
        assert!(!html.contains("tel:"));
    }

    #[tokio::test]
    async fn test_signature_for_prefers_stored_signature() {
        let store = MemoryStore::default();
        let seller = store.add_seller("ana@example.com");

        let html = signature_for(&store, seller.id).await.unwrap();
        assert!(html.contains("ana@example.com"));

        store.upsert_signature(seller.id, SIG).await.unwrap();
        assert_eq!(signature_for(&store, seller.id).await.unwrap(), SIG);

        let err = signature_for(&store, SellerId::generate()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_send_email_without_smtp_is_unavailable() {
        let store = MemoryStore::default();
        let seller = store.add_seller("ana@example.com");
        let client = store.add_client("Acme", Some(seller.id));

        let err = send_email(&store, None, &seller, &client, "Hello", "<p>Hi</p>")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
