//! HTTP surface of the admin dashboard and storefront.
//!
//! Every store-scoped route lives under `/api/:store_id/...`. Handlers are thin:
//! they pull the path, query and body apart and hand them to `core`, whose
//! [`Error`](crate::errors::Error) converts into a JSON response.

/// Brand routes
pub mod brands;
/// Category and sub-category routes
pub mod categories;
/// Error to response conversion
pub mod error;
/// Location group and delivery location routes
pub mod locations;
/// Checkout, order list and dashboard routes
pub mod orders;
/// Product, hot-deal and review routes
pub mod products;
/// Catalog search
pub mod search;
/// Store routes
pub mod stores;
/// Payment gateway webhook
pub mod webhook;

use crate::{config::AppConfig, payment::PaymentGateway};
use axum::{
    Json, Router,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Secret the gateway signs webhook bodies with
    pub webhook_secret: Arc<str>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the CORS layer from `[server].allowed_origins`; `"*"` allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| {
                origin
                    .parse()
                    .inspect_err(|_| warn!("Ignoring invalid allowed origin '{origin}'"))
                    .ok()
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Creates the API router.
///
/// Separated from serving so it can be driven directly in tests.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins);

    Router::new()
        .route("/health", get(health))
        .route("/api/stores", get(stores::list).post(stores::create))
        .route("/api/stores/:store_id", get(stores::show))
        .route("/api/webhook", post(webhook::receive))
        .route(
            "/api/:store_id/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/:store_id/categories/:category_id",
            get(categories::show_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/:store_id/subcategories",
            get(categories::list_sub_categories).post(categories::create_sub_category),
        )
        .route(
            "/api/:store_id/subcategories/:sub_category_id",
            get(categories::show_sub_category)
                .patch(categories::update_sub_category)
                .delete(categories::delete_sub_category),
        )
        .route(
            "/api/:store_id/brands",
            get(brands::list).post(brands::create),
        )
        .route(
            "/api/:store_id/brands/:brand_id",
            get(brands::show).patch(brands::update).delete(brands::remove),
        )
        .route(
            "/api/:store_id/location-groups",
            get(locations::list_groups).post(locations::create_group),
        )
        .route(
            "/api/:store_id/location-groups/:group_id",
            delete(locations::delete_group),
        )
        .route(
            "/api/:store_id/location",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/:store_id/location/pincode/:pincode",
            get(locations::lookup_pincode),
        )
        .route(
            "/api/:store_id/location/:location_id",
            get(locations::show_location)
                .patch(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/:store_id/products",
            get(products::list).post(products::create),
        )
        .route("/api/:store_id/products/hot-deals", get(products::hot_deals))
        .route(
            "/api/:store_id/products/:product_id",
            get(products::show)
                .patch(products::update)
                .delete(products::remove),
        )
        .route(
            "/api/:store_id/products/:product_id/reviews",
            get(products::list_reviews).post(products::create_review),
        )
        .route(
            "/api/:store_id/products/:product_id/reviews/:review_id",
            delete(products::delete_review),
        )
        .route("/api/:store_id/search-item", get(search::search))
        .route("/api/:store_id/checkout", post(orders::checkout))
        .route("/api/:store_id/orders", get(orders::list))
        .route("/api/:store_id/dashboard", get(orders::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
