//! Webhook signature verification.
//!
//! Implements Stripe's scheme: the `Stripe-Signature` header carries a
//! timestamp `t` and one or more `v1` HMAC-SHA256 signatures of
//! `"{t}.{payload}"` keyed with the endpoint secret.
//! <https://docs.stripe.com/webhooks#verify-manually>

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::StripeError;
use super::types::Event;

/// Maximum age of a signed payload, in seconds.
pub const TOLERANCE_SECS: i64 = 300;

/// Verify a webhook payload and parse the event.
///
/// # Errors
///
/// Returns [`StripeError::InvalidSignature`] if the header is malformed,
/// too old, or no signature matches, and [`StripeError::Response`] if the
/// verified payload is not an event.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<Event, StripeError> {
    verify_signature(payload, header, secret, now)?;
    serde_json::from_slice(payload).map_err(|e| StripeError::Response(e.to_string()))
}

/// Verify the `Stripe-Signature` header against the raw payload.
///
/// # Errors
///
/// Returns [`StripeError::InvalidSignature`] on any mismatch.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &SecretString,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_string()))?;
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("invalid timestamp".to_string()))?;
    if now.abs_diff(ts) > TOLERANCE_SECS.unsigned_abs() {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature(
            "no v1 signature".to_string(),
        ));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time.
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });
    if !matched {
        return Err(StripeError::InvalidSignature(
            "signature mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Build a valid header for `payload`, for tests and local tooling.
#[must_use]
pub fn sign(payload: &[u8], secret: &SecretString, timestamp: i64) -> String {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes()) else {
        return String::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}
