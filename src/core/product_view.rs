//! Storefront-facing product views.
//!
//! A view is a product with its brand, category, sub-category, variants (each with
//! prices, media and the price resolved for the requested location group) and a
//! rating summary. Views for a page of products are assembled with one query per
//! related table rather than one per product.

use crate::{
    core::pricing::{PricePair, prices_for_group, resolve_price},
    entities::{
        Brand, Category, Review, SubCategory, Variant, VariantMedia, VariantPrice, brand, category,
        product, review, sub_category, variant, variant_media, variant_price,
    },
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantView {
    #[serde(flatten)]
    pub variant: variant::Model,
    /// Price records, narrowed to the requested location group when there is one
    pub variant_prices: Vec<variant_price::Model>,
    pub media: Vec<variant_media::Model>,
    /// Price and MRP for the requested location group
    pub resolved_price: PricePair,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    pub brand: Option<brand::Model>,
    pub category: Option<category::Model>,
    pub sub_category: Option<sub_category::Model>,
    pub variants: Vec<VariantView>,
    /// Mean rating rounded to two decimals, `0.0` without reviews
    pub average_rating: f64,
    pub number_of_ratings: u64,
}

/// Mean of `ratings` rounded to two decimals, and the number of ratings.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rating_summary(ratings: &[i32]) -> (f64, u64) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let average = sum as f64 / ratings.len() as f64;
    ((average * 100.0).round() / 100.0, ratings.len() as u64)
}

fn group_by<T, K>(items: Vec<T>, key: impl Fn(&T) -> K) -> HashMap<K, Vec<T>>
where
    K: std::hash::Hash + Eq,
{
    let mut grouped: HashMap<K, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

/// Builds views for `products`, preserving their order.
///
/// Variant prices are resolved for `target_group`; see
/// [`crate::core::pricing::resolve_price`] for the fallback rules.
pub async fn load_product_views<C>(
    db: &C,
    products: Vec<product::Model>,
    target_group: Option<i64>,
) -> Result<Vec<ProductView>>
where
    C: ConnectionTrait,
{
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();

    let variants = Variant::find()
        .filter(variant::Column::ProductId.is_in(product_ids.clone()))
        .order_by_asc(variant::Column::Id)
        .all(db)
        .await?;
    let variant_ids: Vec<i64> = variants.iter().map(|v| v.id).collect();

    let prices = VariantPrice::find()
        .filter(variant_price::Column::VariantId.is_in(variant_ids.clone()))
        .order_by_asc(variant_price::Column::Id)
        .all(db)
        .await?;
    let media = VariantMedia::find()
        .filter(variant_media::Column::VariantId.is_in(variant_ids))
        .order_by_asc(variant_media::Column::Id)
        .all(db)
        .await?;
    let ratings: Vec<(i64, i32)> = Review::find()
        .select_only()
        .column(review::Column::ProductId)
        .column(review::Column::Rating)
        .filter(review::Column::ProductId.is_in(product_ids))
        .into_tuple()
        .all(db)
        .await?;

    let brand_ids: Vec<i64> = products.iter().filter_map(|p| p.brand_id).collect();
    let category_ids: Vec<i64> = products.iter().map(|p| p.category_id).collect();
    let sub_category_ids: Vec<i64> = products.iter().filter_map(|p| p.sub_category_id).collect();

    let brands: HashMap<i64, brand::Model> = Brand::find()
        .filter(brand::Column::Id.is_in(brand_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();
    let categories: HashMap<i64, category::Model> = Category::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let sub_categories: HashMap<i64, sub_category::Model> = SubCategory::find()
        .filter(sub_category::Column::Id.is_in(sub_category_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut prices_by_variant = group_by(prices, |p| p.variant_id);
    let mut media_by_variant = group_by(media, |m| m.variant_id);
    let mut variants_by_product = group_by(variants, |v| v.product_id);
    let ratings_by_product = group_by(ratings, |(product_id, _)| *product_id);

    Ok(products
        .into_iter()
        .map(|product| {
            let variants = variants_by_product
                .remove(&product.id)
                .unwrap_or_default()
                .into_iter()
                .map(|variant| {
                    let prices = prices_by_variant.remove(&variant.id).unwrap_or_default();
                    let resolved_price = resolve_price(&prices, target_group);
                    VariantView {
                        media: media_by_variant.remove(&variant.id).unwrap_or_default(),
                        variant_prices: prices_for_group(prices, target_group),
                        resolved_price,
                        variant,
                    }
                })
                .collect();

            let ratings: Vec<i32> = ratings_by_product
                .get(&product.id)
                .map(|rows| rows.iter().map(|(_, rating)| *rating).collect())
                .unwrap_or_default();
            let (average_rating, number_of_ratings) = rating_summary(&ratings);

            ProductView {
                brand: product.brand_id.and_then(|id| brands.get(&id).cloned()),
                category: categories.get(&product.category_id).cloned(),
                sub_category: product
                    .sub_category_id
                    .and_then(|id| sub_categories.get(&id).cloned()),
                variants,
                average_rating,
                number_of_ratings,
                product,
            }
        })
        .collect())
}
