use super::AppState;
use crate::{
    core::location::{self, DeliveryInfo, LocationGroupInput, LocationInput},
    entities::{LocationGroupModel, LocationModel},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn list_groups(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<LocationGroupModel>>> {
    location::list_location_groups(&state.db, store_id)
        .await
        .map(Json)
}

pub async fn create_group(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<LocationGroupInput>,
) -> Result<Json<LocationGroupModel>> {
    location::create_location_group(&state.db, store_id, input)
        .await
        .map(Json)
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path((store_id, group_id)): Path<(i64, i64)>,
) -> Result<Json<LocationGroupModel>> {
    location::delete_location_group(&state.db, store_id, group_id)
        .await
        .map(Json)
}

pub async fn list_locations(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<LocationModel>>> {
    location::list_locations(&state.db, store_id).await.map(Json)
}

pub async fn create_location(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<LocationInput>,
) -> Result<Json<LocationModel>> {
    location::create_location(&state.db, store_id, input)
        .await
        .map(Json)
}

pub async fn show_location(
    State(state): State<AppState>,
    Path((store_id, location_id)): Path<(i64, i64)>,
) -> Result<Json<LocationModel>> {
    location::get_location(&state.db, store_id, location_id)
        .await
        .map(Json)
}

pub async fn update_location(
    State(state): State<AppState>,
    Path((store_id, location_id)): Path<(i64, i64)>,
    Json(input): Json<LocationInput>,
) -> Result<Json<LocationModel>> {
    location::update_location(&state.db, store_id, location_id, input)
        .await
        .map(Json)
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path((store_id, location_id)): Path<(i64, i64)>,
) -> Result<Json<LocationModel>> {
    location::delete_location(&state.db, store_id, location_id)
        .await
        .map(Json)
}

/// Storefront delivery check for a pincode.
pub async fn lookup_pincode(
    State(state): State<AppState>,
    Path((store_id, pincode)): Path<(i64, String)>,
) -> Result<Json<DeliveryInfo>> {
    location::lookup_pincode(&state.db, store_id, &pincode)
        .await
        .map(Json)
}
