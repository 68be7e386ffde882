//! Payment gateway seam and webhook handling.
//!
//! The gateway itself is a black box behind [`PaymentGateway`]; this module only
//! knows how to ask it for a payment order and how to authenticate and read the
//! webhook it sends back.

pub mod gateway;
pub mod webhook;

pub use gateway::{GatewayOrder, GatewayOrderRequest, LocalGateway, PaymentGateway};
pub use webhook::{SIGNATURE_HEADER, WebhookAction, parse_event, sign, verify_signature};
