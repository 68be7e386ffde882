use super::AppState;
use crate::{
    core::{
        category::{self, CategoryInput, CategoryTree},
        sub_category::{self, SubCategoryInput, SubCategoryWithName},
    },
    entities::{CategoryModel, SubCategoryModel},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryFilter {
    pub category_id: Option<i64>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<CategoryTree>>> {
    category::list_categories(&state.db, store_id, state.config.catalog.category_tree_depth)
        .await
        .map(Json)
}

pub async fn create_category(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<CategoryModel>> {
    category::create_category(&state.db, store_id, input, state.config.catalog.slug_max_attempts)
        .await
        .map(Json)
}

pub async fn show_category(
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(i64, i64)>,
) -> Result<Json<CategoryTree>> {
    category::get_category(
        &state.db,
        store_id,
        category_id,
        state.config.catalog.category_tree_depth,
    )
    .await
    .map(Json)
}

pub async fn update_category(
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(i64, i64)>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<CategoryModel>> {
    category::update_category(
        &state.db,
        store_id,
        category_id,
        input,
        state.config.catalog.slug_max_attempts,
    )
    .await
    .map(Json)
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path((store_id, category_id)): Path<(i64, i64)>,
) -> Result<Json<CategoryModel>> {
    category::delete_category(&state.db, store_id, category_id)
        .await
        .map(Json)
}

pub async fn list_sub_categories(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Query(filter): Query<SubCategoryFilter>,
) -> Result<Json<Vec<SubCategoryWithName>>> {
    sub_category::list_sub_categories(&state.db, store_id, filter.category_id)
        .await
        .map(Json)
}

pub async fn create_sub_category(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(input): Json<SubCategoryInput>,
) -> Result<Json<SubCategoryModel>> {
    sub_category::create_sub_category(
        &state.db,
        store_id,
        input,
        state.config.catalog.slug_max_attempts,
    )
    .await
    .map(Json)
}

pub async fn show_sub_category(
    State(state): State<AppState>,
    Path((store_id, sub_category_id)): Path<(i64, i64)>,
) -> Result<Json<SubCategoryWithName>> {
    sub_category::get_sub_category(&state.db, store_id, sub_category_id)
        .await
        .map(Json)
}

pub async fn update_sub_category(
    State(state): State<AppState>,
    Path((store_id, sub_category_id)): Path<(i64, i64)>,
    Json(input): Json<SubCategoryInput>,
) -> Result<Json<SubCategoryModel>> {
    sub_category::update_sub_category(
        &state.db,
        store_id,
        sub_category_id,
        input,
        state.config.catalog.slug_max_attempts,
    )
    .await
    .map(Json)
}

pub async fn delete_sub_category(
    State(state): State<AppState>,
    Path((store_id, sub_category_id)): Path<(i64, i64)>,
) -> Result<Json<SubCategoryModel>> {
    sub_category::delete_sub_category(&state.db, store_id, sub_category_id)
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::test_support::*;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_category_tree_over_http() {
        let (db, store) = setup_with_store().await.unwrap();
        let (status, category) = send(
            &db,
            json_request(
                Method::POST,
                &format!("/api/{}/categories", store.id),
                &json!({ "name": "Home Audio" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(category["slug"], "home-audio");
        let category_id = category["id"].as_i64().unwrap();

        let (status, speakers) = send(
            &db,
            json_request(
                Method::POST,
                &format!("/api/{}/subcategories", store.id),
                &json!({ "name": "Speakers", "categoryId": category_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let speakers_id = speakers["id"].as_i64().unwrap();

        let (status, _) = send(
            &db,
            json_request(
                Method::POST,
                &format!("/api/{}/subcategories", store.id),
                &json!({ "name": "Bookshelf", "categoryId": category_id, "parentId": speakers_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, tree) = send(
            &db,
            get_request(&format!("/api/{}/categories/{category_id}", store.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tree["subCategories"][0]["name"], "Speakers");
        assert_eq!(
            tree["subCategories"][0]["childSubCategories"][0]["name"],
            "Bookshelf"
        );

        let (_, listed) = send(
            &db,
            get_request(&format!(
                "/api/{}/subcategories?categoryId={category_id}",
                store.id
            )),
        )
        .await;
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["displayName"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Speakers > Bookshelf"));
    }

    #[tokio::test]
    async fn test_self_parent_is_rejected() {
        let (db, store) = setup_with_store().await.unwrap();
        let category = create_test_category(&db, store.id, "Audio").await.unwrap();
        let sub = create_test_sub_category(&db, store.id, category.id, None, "Speakers")
            .await
            .unwrap();

        let (status, body) = send(
            &db,
            json_request(
                Method::PATCH,
                &format!("/api/{}/subcategories/{}", store.id, sub.id),
                &json!({ "name": "Speakers", "categoryId": category.id, "parentId": sub.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_delete_category_in_use_is_409() {
        let (db, store) = setup_with_store().await.unwrap();
        let category = create_test_category(&db, store.id, "Audio").await.unwrap();
        create_test_sub_category(&db, store.id, category.id, None, "Speakers")
            .await
            .unwrap();

        let request = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/{}/categories/{}", store.id, category.id))
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _) = send(&db, request).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
