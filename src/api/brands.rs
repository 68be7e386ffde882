use super::AppState;
use crate::{
    core::brand::{self, BrandInput},
    entities::BrandModel,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<BrandModel>>> {
    brand::list_brands(&state.db, store_id).await.map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<BrandInput>,
) -> Result<Json<BrandModel>> {
    brand::create_brand(&state.db, store_id, input, state.config.catalog.slug_max_attempts)
        .await
        .map(Json)
}

pub async fn show(
    State(state): State<AppState>,
    Path((store_id, brand_id)): Path<(i64, i64)>,
) -> Result<Json<BrandModel>> {
    brand::get_brand(&state.db, store_id, brand_id).await.map(Json)
}

pub async fn update(
    State(state): State<AppState>,
    Path((store_id, brand_id)): Path<(i64, i64)>,
    Json(input): Json<BrandInput>,
) -> Result<Json<BrandModel>> {
    brand::update_brand(
        &state.db,
        store_id,
        brand_id,
        input,
        state.config.catalog.slug_max_attempts,
    )
    .await
    .map(Json)
}

pub async fn remove(
    State(state): State<AppState>,
    Path((store_id, brand_id)): Path<(i64, i64)>,
) -> Result<Json<BrandModel>> {
    brand::delete_brand(&state.db, store_id, brand_id).await.map(Json)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::test_support::*;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_brand_names_get_distinct_slugs() {
        let (db, store) = setup_with_store().await.unwrap();
        let uri = format!("/api/{}/brands", store.id);
        let (_, first) = send(&db, json_request(Method::POST, &uri, &json!({ "name": "Acme" }))).await;
        let (_, second) =
            send(&db, json_request(Method::POST, &uri, &json!({ "name": "Acme" }))).await;
        assert_eq!(first["slug"], "acme");
        assert_eq!(second["slug"], "acme-1");

        let (status, missing) =
            send(&db, get_request(&format!("/api/{}/brands/404", store.id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(missing["error"].as_str().unwrap().contains("brand"));
    }
}
