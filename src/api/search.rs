use super::AppState;
use crate::{
    core::search::{self, SearchParams, SearchResults},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

pub async fn search(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>> {
    let catalog = &state.config.catalog;
    search::search(
        &state.db,
        store_id,
        &params,
        catalog.default_page_size,
        catalog.category_tree_depth,
    )
    .await
    .map(Json)
}
