//! Product review business logic.

use crate::{
    core::{product::find_product, store::ensure_store_exists},
    entities::{Review, review},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub user_id: String,
    pub user_name: String,
    pub rating: i32,
    pub text: String,
}

fn validate_review(input: &ReviewInput) -> Result<()> {
    if input.user_id.trim().is_empty() || input.user_name.trim().is_empty() {
        return Err(Error::validation("User is required"));
    }
    if input.text.trim().is_empty() {
        return Err(Error::validation("Review text is required"));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
        return Err(Error::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    Ok(())
}

/// Adds a review to a product of the store.
#[instrument(skip(db, input), fields(rating = input.rating))]
pub async fn create_review(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    input: ReviewInput,
) -> Result<review::Model> {
    validate_review(&input)?;
    ensure_store_exists(db, store_id).await?;
    find_product(db, store_id, product_id).await?;

    let review = review::ActiveModel {
        product_id: Set(product_id),
        user_id: Set(input.user_id.trim().to_string()),
        user_name: Set(input.user_name.trim().to_string()),
        rating: Set(input.rating),
        text: Set(input.text.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let review = review.insert(db).await?;
    info!("Review {} added to product {}", review.id, product_id);
    Ok(review)
}

/// Lists a product's reviews, newest first.
pub async fn list_reviews(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
) -> Result<Vec<review::Model>> {
    ensure_store_exists(db, store_id).await?;
    find_product(db, store_id, product_id).await?;
    Review::find()
        .filter(review::Column::ProductId.eq(product_id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes one review of a product.
#[instrument(skip(db))]
pub async fn delete_review(
    db: &DatabaseConnection,
    store_id: i64,
    product_id: i64,
    review_id: i64,
) -> Result<review::Model> {
    ensure_store_exists(db, store_id).await?;
    find_product(db, store_id, product_id).await?;
    let review = Review::find_by_id(review_id)
        .filter(review::Column::ProductId.eq(product_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("review", review_id))?;
    Review::delete_by_id(review_id).exec(db).await?;
    Ok(review)
}
