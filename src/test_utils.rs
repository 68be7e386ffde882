//! Shared test utilities.
//!
//! This module provides helpers for setting up an in-memory database and creating
//! catalog records with sensible defaults.

use crate::{
    core::{category, product, store, sub_category},
    entities::{self, Variant, variant},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, PaginatorTrait, QueryOrder, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a store through the store operations.
pub async fn create_test_store(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::store::Model> {
    store::create_store(db, name).await
}

/// Fresh database plus one store, the starting point of most tests.
pub async fn setup_with_store() -> Result<(DatabaseConnection, entities::store::Model)> {
    let db = setup_test_db().await?;
    let store = create_test_store(&db, "Test Store").await?;
    Ok((db, store))
}

/// Inserts a category with an exact slug, bypassing slug generation.
pub async fn create_category_with_slug(
    db: &DatabaseConnection,
    store_id: i64,
    name: &str,
    slug: &str,
) -> Result<entities::category::Model> {
    let now = Utc::now().naive_utc();
    entities::category::ActiveModel {
        store_id: Set(store_id),
        name: Set(name.to_string()),
        slug: Set(slug.to_string()),
        banner_image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    store_id: i64,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(
        db,
        store_id,
        category::CategoryInput {
            name: name.to_string(),
            banner_image: None,
        },
        100,
    )
    .await
}

pub async fn create_test_sub_category(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: i64,
    parent_id: Option<i64>,
    name: &str,
) -> Result<entities::sub_category::Model> {
    sub_category::create_sub_category(
        db,
        store_id,
        sub_category::SubCategoryInput {
            name: name.to_string(),
            category_id,
            parent_id,
            banner_image: None,
        },
        100,
    )
    .await
}

pub async fn create_test_location_group(
    db: &DatabaseConnection,
    store_id: i64,
    name: &str,
) -> Result<entities::location_group::Model> {
    entities::location_group::ActiveModel {
        store_id: Set(store_id),
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

pub async fn create_test_location(
    db: &DatabaseConnection,
    store_id: i64,
    pincode: &str,
    location_group_id: Option<i64>,
) -> Result<entities::location::Model> {
    entities::location::ActiveModel {
        store_id: Set(store_id),
        pincode: Set(pincode.to_string()),
        city: Set("Test City".to_string()),
        state: Set("Test State".to_string()),
        country: Set("India".to_string()),
        is_cod_available: Set(true),
        delivery_days: Set(3),
        location_group_id: Set(location_group_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Product payload with one variant priced in one location group.
///
/// # Defaults
/// * mrp: `price + 100.0`
/// * no SKU, HSN, media, brand or sub-category
pub fn product_input(
    category_id: i64,
    name: &str,
    location_group_id: i64,
    price: f64,
    stock: i32,
) -> product::ProductInput {
    product::ProductInput {
        name: name.to_string(),
        slug: None,
        description: format!("{name} description"),
        about: None,
        warranty: None,
        express_delivery: false,
        is_featured: false,
        is_archived: false,
        is_new_arrival: false,
        category_id,
        sub_category_id: None,
        brand_id: None,
        variants: vec![product::VariantInput {
            id: None,
            size_id: None,
            color_id: None,
            stock,
            sku: None,
            hsn: None,
            media: Vec::new(),
            variant_prices: vec![product::VariantPriceInput {
                location_group_id,
                price,
                mrp: price + 100.0,
            }],
        }],
    }
}

pub async fn create_test_product(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: i64,
    name: &str,
    location_group_id: i64,
    price: f64,
    stock: i32,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        store_id,
        product_input(category_id, name, location_group_id, price, stock),
        100,
    )
    .await
}

/// Lowest-id variant of a product.
pub async fn first_variant(db: &DatabaseConnection, product_id: i64) -> Result<variant::Model> {
    Variant::find()
        .filter(variant::Column::ProductId.eq(product_id))
        .order_by_asc(variant::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("variant", product_id))
}

/// Inserts an order with `(variant_id, quantity, unit_price)` items.
pub async fn create_test_order(
    db: &DatabaseConnection,
    store_id: i64,
    items: &[(i64, i32, f64)],
    is_paid: bool,
    created_at: DateTime<Utc>,
) -> Result<entities::order::Model> {
    let count = entities::Order::find().count(db).await?;
    let order = entities::order::ActiveModel {
        store_id: Set(store_id),
        order_number: Set(format!("T{:06}", count + 1)),
        is_paid: Set(is_paid),
        address: Set(String::new()),
        phone: Set(String::new()),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (variant_id, quantity, unit_price) in items {
        entities::order_item::ActiveModel {
            order_id: Set(order.id),
            variant_id: Set(*variant_id),
            quantity: Set(*quantity),
            unit_price: Set(*unit_price),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(order)
}
