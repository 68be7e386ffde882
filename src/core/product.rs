//! Product business logic - Catalog products and their variants.
//!
//! A product owns one or more variants; each variant owns its price records (one per
//! location group) and media. Writes validate the whole payload up front and then
//! run inside a single database transaction so a product is never left half-saved.

use crate::{
    core::{
        brand::find_brand,
        category::find_category,
        location::find_location_group,
        pricing::resolve_location_group,
        product_view::{ProductView, load_product_views},
        slug::{SlugKind, generate_unique_slug, slug_in_use, validate_slug},
        store::ensure_store_exists,
        sub_category::find_sub_category,
    },
    entities::{
        OrderItem, Product, Review, Variant, VariantMedia, VariantPrice, order_item, product,
        review, variant, variant_media, variant_price,
    },
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryOrder, QuerySelect, QueryTrait, Set,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Media types a variant may carry.
pub const MEDIA_TYPES: [&str; 2] = ["IMAGE", "VIDEO"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPriceInput {
    pub location_group_id: i64,
    pub price: f64,
    pub mrp: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput {
    pub url: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
}

fn default_media_type() -> String {
    MEDIA_TYPES[0].to_string()
}

/// One variant in a product payload. Variants carrying an `id` are updated in place.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub size_id: Option<i64>,
    #[serde(default)]
    pub color_id: Option<i64>,
    pub stock: i32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub hsn: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaInput>,
    #[serde(default)]
    pub variant_prices: Vec<VariantPriceInput>,
}

/// Full product payload for create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    /// Explicit slug; generated from `name` when absent
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub warranty: Option<String>,
    #[serde(default)]
    pub express_delivery: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_new_arrival: bool,
    pub category_id: i64,
    #[serde(default)]
    pub sub_category_id: Option<i64>,
    #[serde(default)]
    pub brand_id: Option<i64>,
    pub variants: Vec<VariantInput>,
}

/// Query-string filters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    pub slug: Option<String>,
    pub category_id: Option<i64>,
    pub sub_category_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub color_id: Option<i64>,
    pub size_id: Option<i64>,
    pub is_featured: Option<bool>,
    /// Comma-separated variant ids
    pub variant_ids: Option<String>,
    /// `"min-max"`, or a single number meaning "at least"
    pub price: Option<String>,
    pub location_group_id: Option<i64>,
    pub pincode: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// One page of products plus the number of products matching the filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<ProductView>,
    pub total_count: u64,
}

/// Inclusive price bounds parsed from a `price` filter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

fn parse_bound(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| Error::validation(format!("Invalid price bound '{raw}'")))
}

/// Parses `"100-500"`, `"100-"` or `"5000"` (the latter meaning at least 5000).
pub fn parse_price_range(raw: &str) -> Result<PriceRange> {
    match raw.split_once('-') {
        Some((min, max)) => Ok(PriceRange {
            min: parse_bound(min)?,
            max: parse_bound(max)?,
        }),
        None => Ok(PriceRange {
            min: parse_bound(raw)?,
            max: None,
        }),
    }
}

/// Parses a comma-separated id list such as `"3,4, 9"`.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::validation(format!("Invalid id '{s}'")))
        })
        .collect()
}

fn code(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Checks the parts of a product payload that need no database access.
pub fn validate_product_input(input: &ProductInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    if input.description.trim().is_empty() {
        return Err(Error::validation("Description is required"));
    }
    if input.variants.is_empty() {
        return Err(Error::validation("At least one variant is required"));
    }

    let mut skus = HashSet::new();
    let mut hsns = HashSet::new();
    for (index, variant) in input.variants.iter().enumerate() {
        let position = index + 1;
        if variant.stock < 0 {
            return Err(Error::validation(format!(
                "Variant {position}: stock cannot be negative"
            )));
        }
        if variant.variant_prices.is_empty() {
            return Err(Error::validation(format!(
                "Variant {position}: at least one price is required"
            )));
        }
        for price in &variant.variant_prices {
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(price.price) || !valid(price.mrp) {
                return Err(Error::validation(format!(
                    "Variant {position}: price and MRP must be non-negative"
                )));
            }
        }
        for media in &variant.media {
            if media.url.trim().is_empty() {
                return Err(Error::validation(format!(
                    "Variant {position}: media URL is required"
                )));
            }
            if !MEDIA_TYPES.contains(&media.media_type.to_uppercase().as_str()) {
                return Err(Error::validation(format!(
                    "Variant {position}: media type must be IMAGE or VIDEO"
                )));
            }
        }
        if let Some(sku) = code(variant.sku.as_ref())
            && !skus.insert(sku)
        {
            return Err(Error::validation(format!("Duplicate SKU '{sku}' in variants")));
        }
        if let Some(hsn) = code(variant.hsn.as_ref())
            && !hsns.insert(hsn)
        {
            return Err(Error::validation(format!("Duplicate HSN '{hsn}' in variants")));
        }
    }
    Ok(())
}

/// Checks category, sub-category, brand, location groups and SKU/HSN uniqueness.
///
/// `product_id` is the product being updated; an existing SKU or HSN is acceptable
/// when it belongs to any variant of that product, which lets variants trade codes.
async fn validate_references(
    db: &DatabaseConnection,
    store_id: i64,
    input: &ProductInput,
    product_id: Option<i64>,
) -> Result<()> {
    find_category(db, store_id, input.category_id).await?;
    if let Some(sub_id) = input.sub_category_id {
        let sub = find_sub_category(db, store_id, sub_id).await?;
        if sub.category_id != input.category_id {
            return Err(Error::validation(
                "Sub-category does not belong to the selected category",
            ));
        }
    }
    if let Some(brand_id) = input.brand_id {
        find_brand(db, store_id, brand_id).await?;
    }

    let group_ids: HashSet<i64> = input
        .variants
        .iter()
        .flat_map(|v| v.variant_prices.iter().map(|p| p.location_group_id))
        .collect();
    for group_id in group_ids {
        find_location_group(db, store_id, group_id).await?;
    }

    for variant in &input.variants {
        let checks = [
            ("SKU", variant::Column::Sku, code(variant.sku.as_ref())),
            ("HSN", variant::Column::Hsn, code(variant.hsn.as_ref())),
        ];
        for (label, column, value) in checks {
            let Some(value) = value else { continue };
            let Some(owner) = Variant::find().filter(column.eq(value)).one(db).await? else {
                continue;
            };
            // Codes are unique within the payload, so a sibling owner gives it up
            if product_id != Some(owner.product_id) {
                return Err(Error::conflict(format!("{label} '{value}' is already in use")));
            }
        }
    }
    Ok(())
}

async fn resolve_product_slug(
    txn: &DatabaseTransaction,
    store_id: i64,
    input: &ProductInput,
    existing: Option<&product::Model>,
    slug_max_attempts: usize,
) -> Result<String> {
    let name = input.name.trim();
    let exclude_id = existing.map(|p| p.id);

    if let Some(slug) = input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        validate_slug(slug)?;
        if slug_in_use(txn, SlugKind::Product, store_id, slug, exclude_id).await? {
            return Err(Error::conflict(format!("Slug '{slug}' is already in use")));
        }
        return Ok(slug.to_string());
    }

    match existing {
        Some(product) if product.name == name && !product.slug.is_empty() => {
            Ok(product.slug.clone())
        }
        _ => {
            generate_unique_slug(
                txn,
                SlugKind::Product,
                store_id,
                name,
                exclude_id,
                slug_max_attempts,
            )
            .await
        }
    }
}

async fn insert_variant_children(
    txn: &DatabaseTransaction,
    variant_id: i64,
    input: &VariantInput,
) -> Result<()> {
    for price in &input.variant_prices {
        variant_price::ActiveModel {
            variant_id: Set(variant_id),
            location_group_id: Set(price.location_group_id),
            price: Set(price.price),
            mrp: Set(price.mrp),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    for media in &input.media {
        variant_media::ActiveModel {
            variant_id: Set(variant_id),
            url: Set(media.url.trim().to_string()),
            media_type: Set(media.media_type.to_uppercase()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

async fn insert_variant(
    txn: &DatabaseTransaction,
    product_id: i64,
    input: &VariantInput,
) -> Result<variant::Model> {
    let variant = variant::ActiveModel {
        product_id: Set(product_id),
        size_id: Set(input.size_id),
        color_id: Set(input.color_id),
        stock: Set(input.stock),
        sku: Set(code(input.sku.as_ref()).map(str::to_string)),
        hsn: Set(code(input.hsn.as_ref()).map(str::to_string)),
        ..Default::default()
    }
    .insert(txn)
    .await?;
    insert_variant_children(txn, variant.id, input).await?;
    Ok(variant)
}

async fn delete_variant_children(txn: &DatabaseTransaction, variant_ids: &[i64]) -> Result<()> {
    VariantPrice::delete_many()
        .filter(variant_price::Column::VariantId.is_in(variant_ids.to_vec()))
        .exec(txn)
        .await?;
    VariantMedia::delete_many()
        .filter(variant_media::Column::VariantId.is_in(variant_ids.to_vec()))
        .exec(txn)
        .await?;
    Ok(())
}

async fn delete_variants(txn: &DatabaseTransaction, variant_ids: &[i64]) -> Result<()> {
    delete_variant_children(txn, variant_ids).await?;
    Variant::delete_many()
        .filter(variant::Column::Id.is_in(variant_ids.to_vec()))
        .exec(txn)
        .await?;
    Ok(())
}

async fn count_order_items(db: &DatabaseConnection, variant_ids: &[i64]) -> Result<u64> {
    if variant_ids.is_empty() {
        return Ok(0);
    }
    OrderItem::find()
        .filter(order_item::Column::VariantId.is_in(variant_ids.to_vec()))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Loads a product that belongs to `store_id`, archived or not.
pub async fn find_product<C>(db: &C, store_id: i64, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Creates a product with all of its variants, prices and media.
///
/// # Errors
/// - [`Error::Validation`] for an invalid payload
/// - [`Error::NotFound`] for an unknown category, sub-category, brand or location group
/// - [`Error::Conflict`] for a slug, SKU or HSN already in use
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_product(
    db: &DatabaseConnection,
    store_id: i64,
    input: ProductInput,
    slug_max_attempts: usize,
) -> Result<product::Model> {
    validate_product_input(&input)?;
    ensure_store_exists(db, store_id).await?;
    validate_references(db, store_id, &input, None).await?;

    let txn = db.begin().await?;
    let slug = resolve_product_slug(&txn, store_id, &input, None, slug_max_attempts).await?;

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        store_id: Set(store_id),
        category_id: Set(input.category_id),
        sub_category_id: Set(input.sub_category_id),
        brand_id: Set(input.brand_id),
        name: Set(input.name.trim().to_string()),
        slug: Set(slug),
        description: Set(input.description.trim().to_string()),
        about: Set(input.about.clone()),
        warranty: Set(input.warranty.clone()),
        express_delivery: Set(input.express_delivery),
        is_featured: Set(input.is_featured),
        is_archived: Set(input.is_archived),
        is_new_arrival: Set(input.is_new_arrival),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for variant in &input.variants {
        insert_variant(&txn, product.id, variant).await?;
    }
    txn.commit().await?;

    info!(
        "Created product {} ({}) with {} variant(s)",
        product.id,
        product.slug,
        input.variants.len()
    );
    Ok(product)
}

/// Replaces a product's fields and variants.
///
/// Variants carrying an id are updated and get their prices and media replaced;
/// variants without an id are created; variants missing from the payload are deleted.
///
/// # Errors
/// Besides the errors of [`create_product`], returns [`Error::Conflict`] when a
/// variant that would be deleted has order items.
#[instrument(skip(db, input))]
pub async fn update_product(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    input: ProductInput,
    slug_max_attempts: usize,
) -> Result<product::Model> {
    validate_product_input(&input)?;
    ensure_store_exists(db, store_id).await?;
    let existing = find_product(db, store_id, product_id).await?;

    let mut current: HashMap<i64, variant::Model> = Variant::find()
        .filter(variant::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();
    for id in input.variants.iter().filter_map(|v| v.id) {
        if !current.contains_key(&id) {
            return Err(Error::validation(format!(
                "Variant {id} does not belong to this product"
            )));
        }
    }
    let kept: HashSet<i64> = input.variants.iter().filter_map(|v| v.id).collect();
    let removed: Vec<i64> = current
        .keys()
        .copied()
        .filter(|id| !kept.contains(id))
        .collect();
    if count_order_items(db, &removed).await? > 0 {
        return Err(Error::conflict(
            "Cannot remove variants that appear in orders",
        ));
    }
    validate_references(db, store_id, &input, Some(product_id)).await?;

    let txn = db.begin().await?;
    let slug =
        resolve_product_slug(&txn, store_id, &input, Some(&existing), slug_max_attempts).await?;

    if !removed.is_empty() {
        delete_variants(&txn, &removed).await?;
    }
    // Kept variants may swap codes; release them before rewriting
    Variant::update_many()
        .col_expr(variant::Column::Sku, Expr::value(Option::<String>::None))
        .col_expr(variant::Column::Hsn, Expr::value(Option::<String>::None))
        .filter(variant::Column::Id.is_in(kept.iter().copied()))
        .exec(&txn)
        .await?;
    for variant_input in &input.variants {
        match variant_input.id.and_then(|id| current.remove(&id)) {
            Some(model) => {
                let variant_id = model.id;
                let mut variant: variant::ActiveModel = model.into();
                variant.size_id = Set(variant_input.size_id);
                variant.color_id = Set(variant_input.color_id);
                variant.stock = Set(variant_input.stock);
                variant.sku = Set(code(variant_input.sku.as_ref()).map(str::to_string));
                variant.hsn = Set(code(variant_input.hsn.as_ref()).map(str::to_string));
                variant.update(&txn).await?;
                delete_variant_children(&txn, &[variant_id]).await?;
                insert_variant_children(&txn, variant_id, variant_input).await?;
            }
            None => {
                insert_variant(&txn, product_id, variant_input).await?;
            }
        }
    }

    let mut product: product::ActiveModel = existing.into();
    product.category_id = Set(input.category_id);
    product.sub_category_id = Set(input.sub_category_id);
    product.brand_id = Set(input.brand_id);
    product.name = Set(input.name.trim().to_string());
    product.slug = Set(slug);
    product.description = Set(input.description.trim().to_string());
    product.about = Set(input.about);
    product.warranty = Set(input.warranty);
    product.express_delivery = Set(input.express_delivery);
    product.is_featured = Set(input.is_featured);
    product.is_archived = Set(input.is_archived);
    product.is_new_arrival = Set(input.is_new_arrival);
    product.updated_at = Set(chrono::Utc::now().naive_utc());
    let product = product.update(&txn).await?;
    txn.commit().await?;

    info!(
        "Updated product {} ({} variant(s) removed)",
        product.id,
        removed.len()
    );
    Ok(product)
}

/// Deletes a product with its variants and reviews.
///
/// # Errors
/// Returns [`Error::Conflict`] when any variant has order items; archive such
/// products instead.
#[instrument(skip(db))]
pub async fn delete_product(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
) -> Result<product::Model> {
    ensure_store_exists(db, store_id).await?;
    let product = find_product(db, store_id, product_id).await?;

    let variant_ids: Vec<i64> = Variant::find()
        .select_only()
        .column(variant::Column::Id)
        .filter(variant::Column::ProductId.eq(product_id))
        .into_tuple()
        .all(db)
        .await?;
    if count_order_items(db, &variant_ids).await? > 0 {
        return Err(Error::conflict(
            "Product has orders; archive it instead of deleting",
        ));
    }

    let txn = db.begin().await?;
    if !variant_ids.is_empty() {
        delete_variants(&txn, &variant_ids).await?;
    }
    Review::delete_many()
        .filter(review::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    Product::delete_by_id(product_id).exec(&txn).await?;
    txn.commit().await?;

    info!("Deleted product {}", product_id);
    Ok(product)
}

/// Retrieves one product view by id, including archived products.
pub async fn get_product_view(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    location_group_id: Option<i64>,
    pincode: Option<&str>,
) -> Result<ProductView> {
    ensure_store_exists(db, store_id).await?;
    let product = find_product(db, store_id, product_id).await?;
    let target_group = resolve_location_group(db, store_id, location_group_id, pincode).await?;
    load_product_views(db, vec![product], target_group)
        .await?
        .pop()
        .ok_or_else(|| Error::not_found("product", product_id))
}

/// Retrieves a non-archived product by slug.
pub async fn get_product_by_slug(
    db: &DatabaseConnection,
    store_id: i64,
    slug: &str,
    location_group_id: Option<i64>,
    pincode: Option<&str>,
) -> Result<ProductView> {
    ensure_store_exists(db, store_id).await?;
    let product = Product::find()
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::Slug.eq(slug))
        .filter(product::Column::IsArchived.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("product", slug))?;
    let target_group = resolve_location_group(db, store_id, location_group_id, pincode).await?;
    load_product_views(db, vec![product], target_group)
        .await?
        .pop()
        .ok_or_else(|| Error::not_found("product", slug))
}

/// Lists non-archived products matching `filters`, newest first.
///
/// Variant-level filters (colour, size, variant ids, price) keep a product when at
/// least one of its variants matches all of them. The price filter only applies
/// once a location group has been resolved, since prices are per group.
#[instrument(skip(db, filters))]
pub async fn list_products(
    db: &DatabaseConnection,
    store_id: i64,
    filters: &ProductFilters,
    default_limit: u64,
) -> Result<ProductPage> {
    ensure_store_exists(db, store_id).await?;

    if let Some(sub_id) = filters.sub_category_id {
        let sub = find_sub_category(db, store_id, sub_id).await?;
        if filters.category_id.is_some_and(|c| c != sub.category_id) {
            return Err(Error::validation(
                "Sub-category does not belong to the specified category",
            ));
        }
    }
    let target_group = resolve_location_group(
        db,
        store_id,
        filters.location_group_id,
        filters.pincode.as_deref(),
    )
    .await?;

    let mut query = Product::find()
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsArchived.eq(false));
    if let Some(category_id) = filters.category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(sub_id) = filters.sub_category_id {
        query = query.filter(product::Column::SubCategoryId.eq(sub_id));
    }
    if let Some(brand_id) = filters.brand_id {
        query = query.filter(product::Column::BrandId.eq(brand_id));
    }
    if let Some(featured) = filters.is_featured {
        query = query.filter(product::Column::IsFeatured.eq(featured));
    }

    let variant_ids = filters
        .variant_ids
        .as_deref()
        .map(parse_id_list)
        .transpose()?;
    let price_range = match (filters.price.as_deref(), target_group) {
        (Some(raw), Some(group_id)) => Some((parse_price_range(raw)?, group_id)),
        _ => None,
    };
    if filters.color_id.is_some()
        || filters.size_id.is_some()
        || variant_ids.is_some()
        || price_range.is_some()
    {
        let mut variants = Variant::find()
            .select_only()
            .column(variant::Column::ProductId);
        if let Some(color_id) = filters.color_id {
            variants = variants.filter(variant::Column::ColorId.eq(color_id));
        }
        if let Some(size_id) = filters.size_id {
            variants = variants.filter(variant::Column::SizeId.eq(size_id));
        }
        if let Some(ids) = variant_ids {
            variants = variants.filter(variant::Column::Id.is_in(ids));
        }
        if let Some((range, group_id)) = price_range {
            variants = variants
                .inner_join(VariantPrice)
                .filter(variant_price::Column::LocationGroupId.eq(group_id));
            if let Some(min) = range.min {
                variants = variants.filter(variant_price::Column::Price.gte(min));
            }
            if let Some(max) = range.max {
                variants = variants.filter(variant_price::Column::Price.lte(max));
            }
        }
        query = query.filter(product::Column::Id.in_subquery(variants.into_query()));
    }

    let total_count = query.clone().count(db).await?;
    let limit = filters.limit.filter(|l| *l > 0).unwrap_or(default_limit);
    let page = filters.page.unwrap_or(1).max(1);
    let products = query
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .offset((page - 1).saturating_mul(limit))
        .limit(limit)
        .all(db)
        .await?;

    Ok(ProductPage {
        products: load_product_views(db, products, target_group).await?,
        total_count,
    })
}
