use super::AppState;
use crate::{
    core::{
        hot_deals::{self, HotDeal, HotDealsParams, HotDealsQuery},
        product::{self, ProductFilters, ProductInput},
        product_view::ProductView,
        review::{self, ReviewInput},
    },
    entities::{ProductModel, ReviewModel},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

/// Where the shopper is, for picking prices.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationParams {
    pub location_group_id: Option<i64>,
    pub pincode: Option<String>,
}

/// Lists products, or returns the single product named by `?slug=`.
pub async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Query(filters): Query<ProductFilters>,
) -> Result<Response> {
    if let Some(slug) = filters.slug.as_deref().filter(|s| !s.is_empty()) {
        let view = product::get_product_by_slug(
            &state.db,
            store_id,
            slug,
            filters.location_group_id,
            filters.pincode.as_deref(),
        )
        .await?;
        return Ok(Json(view).into_response());
    }

    let page =
        product::list_products(&state.db, store_id, &filters, state.config.catalog.default_page_size)
            .await?;
    Ok(Json(page).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductModel>> {
    product::create_product(&state.db, store_id, input, state.config.catalog.slug_max_attempts)
        .await
        .map(Json)
}

pub async fn show(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Query(location): Query<LocationParams>,
) -> Result<Json<ProductView>> {
    product::get_product_view(
        &state.db,
        store_id,
        product_id,
        location.location_group_id,
        location.pincode.as_deref(),
    )
    .await
    .map(Json)
}

pub async fn update(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductModel>> {
    product::update_product(
        &state.db,
        store_id,
        product_id,
        input,
        state.config.catalog.slug_max_attempts,
    )
    .await
    .map(Json)
}

pub async fn remove(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<ProductModel>> {
    product::delete_product(&state.db, store_id, product_id)
        .await
        .map(Json)
}

/// Best sellers over the requested `timeFrame`.
pub async fn hot_deals(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Query(params): Query<HotDealsParams>,
) -> Result<Json<Vec<HotDeal>>> {
    let query = HotDealsQuery::from_params(params, state.config.catalog.default_page_size)?;
    hot_deals::hot_deals(&state.db, store_id, &query, Utc::now())
        .await
        .map(Json)
}

pub async fn list_reviews(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<ReviewModel>>> {
    review::list_reviews(&state.db, store_id, product_id)
        .await
        .map(Json)
}

pub async fn create_review(
    State(state): State<AppState>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<ReviewModel>> {
    review::create_review(&state.db, store_id, product_id, input)
        .await
        .map(Json)
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path((store_id, product_id, review_id)): Path<(i64, i64, i64)>,
) -> Result<Json<ReviewModel>> {
    review::delete_review(&state.db, store_id, product_id, review_id)
        .await
        .map(Json)
}
