//! Payment gateway credentials loaded from environment variables.
//!
//! Secrets never go into config.toml. `PAYMENT_KEY_ID` is public (it is handed
//! to the storefront with every checkout) and `PAYMENT_WEBHOOK_SECRET` signs
//! webhook bodies.

use crate::errors::{Error, Result};

/// Credentials for the payment gateway
#[derive(Clone)]
pub struct PaymentCredentials {
    /// Public key id returned to the storefront
    pub key_id: String,
    /// Shared secret for webhook HMAC signatures
    pub webhook_secret: String,
}

impl std::fmt::Debug for PaymentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCredentials")
            .field("key_id", &self.key_id)
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    let value = std::env::var(name)?;
    if value.trim().is_empty() {
        return Err(Error::Config {
            message: format!("{name} is set but empty"),
        });
    }
    Ok(value)
}

/// Reads `PAYMENT_KEY_ID` and `PAYMENT_WEBHOOK_SECRET`.
///
/// # Errors
/// Returns an error if any of the variables is missing or empty.
pub fn load_payment_credentials() -> Result<PaymentCredentials> {
    Ok(PaymentCredentials {
        key_id: required("PAYMENT_KEY_ID")?,
        webhook_secret: required("PAYMENT_WEBHOOK_SECRET")?,
    })
}
