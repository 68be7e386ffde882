//! Payment gateway callbacks.
//!
//! The signature covers the raw body, so the body is taken as [`Bytes`] and only
//! parsed after it verifies.

use super::AppState;
use crate::{
    core::order::confirm_payment,
    errors::{Error, Result},
    payment::{SIGNATURE_HEADER, WebhookAction, parse_event, verify_signature},
};
use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&state.webhook_secret, &body, signature) {
        warn!("Rejected webhook with a missing or invalid signature");
        return Err(Error::InvalidSignature);
    }

    match parse_event(&body)? {
        WebhookAction::ConfirmPayment {
            order_id,
            address,
            phone,
        } => {
            let confirmation = confirm_payment(&state.db, order_id, &address, &phone).await?;
            info!(
                order_id,
                already_paid = confirmation.already_paid,
                "Payment webhook processed"
            );
            Ok(Json(json!({ "received": true, "orderId": order_id })))
        }
        WebhookAction::Ignore { event } => {
            debug!("Ignoring webhook event {event}");
            Ok(Json(json!({ "received": true })))
        }
    }
}
