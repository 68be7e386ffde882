//! Payment webhook authentication and parsing.
//!
//! The gateway signs the raw request body with HMAC-SHA256 using the shared webhook
//! secret and sends the hex digest in [`SIGNATURE_HEADER`].

use crate::errors::{Error, Result};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded body signature.
pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Events that confirm a payment.
pub const PAYMENT_EVENTS: [&str; 2] = ["payment.authorized", "order.paid"];

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature_hex` against the body in constant time.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: Option<EventPayload>,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    payment: Option<EntityWrapper>,
}

#[derive(Debug, Deserialize)]
struct EntityWrapper {
    entity: PaymentEntity,
}

#[derive(Debug, Deserialize)]
struct PaymentEntity {
    #[serde(default)]
    notes: HashMap<String, Value>,
    #[serde(default)]
    contact: Option<String>,
}

/// What a webhook asks the store to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    /// Mark the order paid and record the delivery details
    ConfirmPayment {
        order_id: i64,
        address: String,
        phone: String,
    },
    /// Event the store does not act on
    Ignore { event: String },
}

fn note_string(notes: &HashMap<String, Value>, key: &str) -> Option<String> {
    match notes.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a verified webhook body.
///
/// # Errors
/// Returns [`Error::Validation`] for malformed JSON or a payment event without an
/// order id in its notes.
pub fn parse_event(body: &[u8]) -> Result<WebhookAction> {
    let event: WebhookEvent = serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("Malformed webhook body: {e}")))?;
    debug!("Webhook event {}", event.event);

    if !PAYMENT_EVENTS.contains(&event.event.as_str()) {
        return Ok(WebhookAction::Ignore { event: event.event });
    }

    let entity = event
        .payload
        .and_then(|p| p.payment)
        .map(|p| p.entity)
        .ok_or_else(|| Error::validation("Webhook payload has no payment entity"))?;
    let order_id = note_string(&entity.notes, "orderId")
        .ok_or_else(|| Error::validation("Order ID not found in webhook"))?;
    let order_id = order_id
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::validation(format!("Invalid order ID '{order_id}' in webhook")))?;

    Ok(WebhookAction::ConfirmPayment {
        order_id,
        address: note_string(&entity.notes, "address").unwrap_or_default(),
        phone: entity.contact.unwrap_or_default(),
    })
}
