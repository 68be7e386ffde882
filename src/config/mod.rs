/// Application settings loaded from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Payment gateway credentials from environment variables
pub mod payment;

pub use app::{AppConfig, CatalogConfig, CheckoutConfig, ServerConfig};
