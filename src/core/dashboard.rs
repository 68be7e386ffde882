//! Admin dashboard figures.
//!
//! Revenue is computed from the unit price stored on each order item at checkout, so
//! later price changes do not rewrite past revenue. All functions return plain data
//! for the API layer to serialize.

use crate::{
    core::store::ensure_store_exists,
    entities::{Order, OrderItem, Product, Variant, order, order_item, product, variant},
    errors::Result,
};
use chrono::Datelike;
use sea_orm::{PaginatorTrait, QuerySelect, prelude::*};
use serde::Serialize;

/// Month labels of the revenue graph, January first.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Revenue of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphPoint {
    pub name: &'static str,
    pub total: f64,
}

/// Everything the dashboard overview shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub sales_count: u64,
    pub products_in_stock: u64,
    pub graph_revenue: Vec<GraphPoint>,
}

/// Buckets `(month_index, amount)` pairs into twelve months; `month_index` is 0-based
/// and out-of-range entries are ignored.
#[must_use]
pub fn monthly_revenue(entries: impl IntoIterator<Item = (usize, f64)>) -> Vec<GraphPoint> {
    let mut totals = [0.0_f64; 12];
    for (month, amount) in entries {
        if let Some(total) = totals.get_mut(month) {
            *total += amount;
        }
    }
    MONTHS
        .iter()
        .zip(totals)
        .map(|(name, total)| GraphPoint { name, total })
        .collect()
}

/// Paid orders of the store with their items.
async fn paid_orders(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<Vec<(order::Model, Vec<order_item::Model>)>> {
    Order::find()
        .filter(order::Column::StoreId.eq(store_id))
        .filter(order::Column::IsPaid.eq(true))
        .find_with_related(OrderItem)
        .all(db)
        .await
        .map_err(Into::into)
}

fn items_total(items: &[order_item::Model]) -> f64 {
    items
        .iter()
        .map(|item| item.unit_price * f64::from(item.quantity))
        .sum()
}

/// Sum of quantity times unit price over all items of paid orders.
pub async fn total_revenue(db: &DatabaseConnection, store_id: i64) -> Result<f64> {
    let orders = paid_orders(db, store_id).await?;
    Ok(orders.iter().map(|(_, items)| items_total(items)).sum())
}

/// Number of paid orders.
pub async fn sales_count(db: &DatabaseConnection, store_id: i64) -> Result<u64> {
    Order::find()
        .filter(order::Column::StoreId.eq(store_id))
        .filter(order::Column::IsPaid.eq(true))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Number of distinct products with at least one variant in stock.
pub async fn products_in_stock(db: &DatabaseConnection, store_id: i64) -> Result<u64> {
    let ids: Vec<i64> = Variant::find()
        .select_only()
        .column(variant::Column::ProductId)
        .distinct()
        .inner_join(Product)
        .filter(product::Column::StoreId.eq(store_id))
        .filter(variant::Column::Stock.gt(0))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.len() as u64)
}

/// Paid revenue per calendar month of order creation, all years combined.
pub async fn graph_revenue(db: &DatabaseConnection, store_id: i64) -> Result<Vec<GraphPoint>> {
    let orders = paid_orders(db, store_id).await?;
    Ok(monthly_revenue(orders.iter().map(|(order, items)| {
        (order.created_at.month0() as usize, items_total(items))
    })))
}

/// Collects every dashboard figure for a store.
pub async fn dashboard_summary(db: &DatabaseConnection, store_id: i64) -> Result<DashboardSummary> {
    ensure_store_exists(db, store_id).await?;
    Ok(DashboardSummary {
        total_revenue: total_revenue(db, store_id).await?,
        sales_count: sales_count(db, store_id).await?,
        products_in_stock: products_in_stock(db, store_id).await?,
        graph_revenue: graph_revenue(db, store_id).await?,
    })
}
