//! Payment gateway trait and the local implementation.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::info;

/// Request for a payment order, amounts in minor units (paise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOrderRequest {
    pub amount: i64,
    pub currency: String,
    /// Merchant reference, the order number
    pub receipt: String,
    /// Echoed back by the gateway in webhook payloads
    pub notes: BTreeMap<String, String>,
}

/// Payment order created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// A payment provider able to open payment orders.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment order the storefront can complete in the gateway's checkout.
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder>;

    /// Public key id handed to the storefront checkout widget.
    fn key_id(&self) -> &str;
}

/// Gateway that allocates payment order ids in-process.
///
/// Used for local development and tests: the payment itself is then confirmed by
/// posting a signed webhook.
#[derive(Debug)]
pub struct LocalGateway {
    key_id: String,
    next_id: AtomicU64,
}

impl LocalGateway {
    #[must_use]
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl PaymentGateway for LocalGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder> {
        if request.amount <= 0 {
            return Err(Error::PaymentGateway {
                message: "amount must be positive".to_string(),
            });
        }
        let id = format!("order_local_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        info!(
            "Opened payment order {} for {} {} ({})",
            id, request.amount, request.currency, request.receipt
        );
        Ok(GatewayOrder {
            id,
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}
