//! Core business logic - framework-agnostic catalog, pricing and order operations.
//!
//! Every operation takes a database connection and plain input types and returns
//! [`crate::errors::Result`]; the HTTP layer only translates requests and errors.

/// Brand CRUD
pub mod brand;
/// Category CRUD and category trees
pub mod category;
/// Dashboard revenue and stock figures
pub mod dashboard;
/// Best-selling products over a time window
pub mod hot_deals;
/// Delivery locations and location groups
pub mod location;
/// Checkout and payment confirmation
pub mod order;
/// Variant price resolution per location group
pub mod pricing;
/// Product CRUD and listings
pub mod product;
/// Product views for storefront responses
pub mod product_view;
/// Product reviews
pub mod review;
/// Catalog search
pub mod search;
/// Unique per-store slugs
pub mod slug;
/// Stores
pub mod store;
/// Sub-category CRUD
pub mod sub_category;
/// Sub-category trees, breadcrumbs and cycle checks
pub mod tree;
