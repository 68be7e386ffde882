use super::AppState;
use crate::{
    core::{
        dashboard::{self, DashboardSummary},
        order::{self, CheckoutRequest, CheckoutResponse, OrderSummary},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

/// Creates an unpaid order and the matching gateway order.
pub async fn checkout(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    let response = order::checkout(
        &state.db,
        state.gateway.as_ref(),
        &state.config.checkout,
        store_id,
        request,
    )
    .await?;
    info!(
        "Checkout opened order {} for {} {}",
        response.order_number, response.amount, response.currency
    );
    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<OrderSummary>>> {
    order::list_orders(&state.db, store_id).await.map(Json)
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(store_id): Path<i64>,
) -> Result<Json<DashboardSummary>> {
    dashboard::dashboard_summary(&state.db, store_id)
        .await
        .map(Json)
}
