//! Application configuration loading from config.toml
//!
//! Everything in the file is optional; a missing key falls back to the default
//! used by the storefront, and a missing file falls back to the defaults entirely.
//! Cross-origin settings live here so handlers never carry their own origin lists.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener and CORS settings
    pub server: ServerConfig,
    /// Catalog behaviour (tree depth, slugs, paging)
    pub catalog: CatalogConfig,
    /// Checkout and order settings
    pub checkout: CheckoutConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:3000"`
    pub bind_address: String,
    /// Origins allowed to call the storefront API from a browser
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// `[catalog]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Levels of `childSubCategories` nested under each top-level sub-category
    pub category_tree_depth: usize,
    /// Candidates tried before slug generation gives up
    pub slug_max_attempts: usize,
    /// Page size used when a listing request does not give one
    pub default_page_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            category_tree_depth: 3,
            slug_max_attempts: 100,
            default_page_size: 12,
        }
    }
}

/// `[checkout]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    /// ISO currency code sent to the payment gateway
    pub currency: String,
    /// Candidates tried before order number generation gives up
    pub order_number_max_attempts: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            order_number_max_attempts: 100,
        }
    }
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: the defaults are used and a warning is logged.
/// A file that exists but does not parse is an error.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        warn!("Config file {} not found, using defaults", path);
        Ok(AppConfig::default())
    }
}
