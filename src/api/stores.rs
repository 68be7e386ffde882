use super::AppState;
use crate::{core::store, entities::StoreModel, errors::Result};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StoreInput {
    pub name: String,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoreModel>>> {
    store::list_stores(&state.db).await.map(Json)
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<StoreInput>,
) -> Result<Json<StoreModel>> {
    store::create_store(&state.db, &input.name).await.map(Json)
}

pub async fn show(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<StoreModel>> {
    store::get_store(&state.db, store_id).await.map(Json)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::test_support::*;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_fetch_store() {
        let db = setup_test_db().await.unwrap();
        let (status, created) = send(
            &db,
            json_request(Method::POST, "/api/stores", &json!({ "name": "Gadget Hub" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], "Gadget Hub");

        let id = created["id"].as_i64().unwrap();
        let (status, fetched) = send(&db, get_request(&format!("/api/stores/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id);

        let (_, all) = send(&db, get_request("/api/stores")).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_store_name_is_400() {
        let db = setup_test_db().await.unwrap();
        let (status, _) = send(
            &db,
            json_request(Method::POST, "/api/stores", &json!({ "name": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
