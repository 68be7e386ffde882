//! Hot deals - products ranked by units sold in paid orders over a recent window.
//!
//! Aggregation and paging are pure functions over `(product_id, quantity)` rows so
//! they can be tested without a database. The database wrapper fetches those rows
//! with one joined query and hydrates only the products on the requested page.

use crate::{
    core::{
        pricing::resolve_location_group,
        product_view::{ProductView, load_product_views},
        store::ensure_store_exists,
    },
    entities::{Order, OrderItem, Product, Variant, order, order_item, product, variant},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{JoinType, QueryOrder, QuerySelect, RelationTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use tracing::{debug, instrument};

/// How far back sales are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    SevenDays,
    #[default]
    ThirtyDays,
    NinetyDays,
    AllTime,
}

impl TimeWindow {
    /// Label used on the wire, e.g. `"30 days"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenDays => "7 days",
            Self::ThirtyDays => "30 days",
            Self::NinetyDays => "90 days",
            Self::AllTime => "all time",
        }
    }

    /// Earliest order creation time inside the window, `None` for all time.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
            Self::NinetyDays => 90,
            Self::AllTime => return None,
        };
        Some(now - Duration::days(days))
    }
}

impl FromStr for TimeWindow {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "7 days" => Ok(Self::SevenDays),
            "30 days" => Ok(Self::ThirtyDays),
            "90 days" => Ok(Self::NinetyDays),
            "all time" => Ok(Self::AllTime),
            other => Err(Error::InvalidTimeWindow {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-string parameters of the hot deals listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotDealsParams {
    pub category_id: Option<i64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub time_frame: Option<String>,
    pub location_group_id: Option<i64>,
    pub pincode: Option<String>,
}

/// Parsed hot deals request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotDealsQuery {
    pub category_id: Option<i64>,
    pub window: TimeWindow,
    /// 1-based; `0` is read as `1`
    pub page: u64,
    pub limit: u64,
    pub location_group_id: Option<i64>,
    pub pincode: Option<String>,
}

impl HotDealsQuery {
    /// Applies defaults to raw parameters.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTimeWindow`] for an unknown `timeFrame`.
    pub fn from_params(params: HotDealsParams, default_limit: u64) -> Result<Self> {
        let window = match params.time_frame.as_deref() {
            Some(raw) => raw.parse()?,
            None => TimeWindow::default(),
        };
        Ok(Self {
            category_id: params.category_id,
            window,
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(default_limit),
            location_group_id: params.location_group_id,
            pincode: params.pincode,
        })
    }
}

/// Units sold of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSales {
    pub product_id: i64,
    pub total_sold: i64,
}

/// A product view with the units it sold in the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotDeal {
    #[serde(flatten)]
    pub product: ProductView,
    pub total_sold: i64,
}

/// Sums quantities per product and sorts by units sold, highest first.
///
/// Ties keep the order in which the products were first seen.
pub fn aggregate_sales(items: impl IntoIterator<Item = (i64, i32)>) -> Vec<ProductSales> {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut sales: Vec<ProductSales> = Vec::new();
    for (product_id, quantity) in items {
        let index = *positions.entry(product_id).or_insert_with(|| {
            sales.push(ProductSales {
                product_id,
                total_sold: 0,
            });
            sales.len() - 1
        });
        sales[index].total_sold += i64::from(quantity);
    }
    sales.sort_by(|a, b| b.total_sold.cmp(&a.total_sold));
    sales
}

/// Returns the 1-based `page` of `items` with `limit` entries per page.
pub fn paginate<T>(items: &[T], page: u64, limit: u64) -> &[T] {
    let page = page.max(1);
    let to_index = |v: u64| usize::try_from(v).unwrap_or(usize::MAX);
    let start = to_index((page - 1).saturating_mul(limit)).min(items.len());
    let end = start.saturating_add(to_index(limit)).min(items.len());
    &items[start..end]
}

/// Loads `(product_id, quantity)` for every item of the store's paid orders created
/// since `since`, skipping archived products and, when given, products outside
/// `category_id`.
pub async fn load_sold_items<C>(
    db: &C,
    store_id: i64,
    category_id: Option<i64>,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<(i64, i32)>>
where
    C: ConnectionTrait,
{
    let mut query = OrderItem::find()
        .select_only()
        .column(variant::Column::ProductId)
        .column(order_item::Column::Quantity)
        .inner_join(Order)
        .inner_join(Variant)
        .join(JoinType::InnerJoin, variant::Relation::Product.def())
        .filter(order::Column::StoreId.eq(store_id))
        .filter(order::Column::IsPaid.eq(true))
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsArchived.eq(false));
    if let Some(since) = since {
        query = query.filter(order::Column::CreatedAt.gte(since));
    }
    if let Some(category_id) = category_id {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }

    query
        .order_by_asc(order_item::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Returns one page of the store's best-selling products.
#[instrument(skip(db))]
pub async fn hot_deals(
    db: &DatabaseConnection,
    store_id: i64,
    query: &HotDealsQuery,
    now: DateTime<Utc>,
) -> Result<Vec<HotDeal>> {
    ensure_store_exists(db, store_id).await?;
    let target_group = resolve_location_group(
        db,
        store_id,
        query.location_group_id,
        query.pincode.as_deref(),
    )
    .await?;

    let items = load_sold_items(db, store_id, query.category_id, query.window.start(now)).await?;
    if items.is_empty() {
        debug!("No paid orders in the last {}", query.window);
        return Ok(Vec::new());
    }

    let ranked = aggregate_sales(items);
    let page = paginate(&ranked, query.page, query.limit);
    if page.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = page.iter().map(|s| s.product_id).collect();
    let mut products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(ids))
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsArchived.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let ordered: Vec<product::Model> = page
        .iter()
        .filter_map(|s| products.remove(&s.product_id))
        .collect();

    let totals: HashMap<i64, i64> = page.iter().map(|s| (s.product_id, s.total_sold)).collect();
    let views = load_product_views(db, ordered, target_group).await?;
    Ok(views
        .into_iter()
        .map(|view| HotDeal {
            total_sold: totals.get(&view.product.id).copied().unwrap_or_default(),
            product: view,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_time_window_parsing() {
        assert_eq!("7 days".parse::<TimeWindow>().unwrap(), TimeWindow::SevenDays);
        assert_eq!("all time".parse::<TimeWindow>().unwrap(), TimeWindow::AllTime);
        assert!(matches!(
            "yesterday".parse::<TimeWindow>(),
            Err(Error::InvalidTimeWindow { .. })
        ));
        assert_eq!(TimeWindow::default().as_str(), "30 days");
    }

    #[test]
    fn test_time_window_start() {
        let now = Utc::now();
        assert_eq!(TimeWindow::SevenDays.start(now), Some(now - Duration::days(7)));
        assert_eq!(TimeWindow::AllTime.start(now), None);
    }

    #[test]
    fn test_query_defaults() {
        let query = HotDealsQuery::from_params(HotDealsParams::default(), 12).unwrap();
        assert_eq!(query.window, TimeWindow::ThirtyDays);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 12);

        let bad = HotDealsParams {
            time_frame: Some("1 year".to_string()),
            ..Default::default()
        };
        assert!(HotDealsQuery::from_params(bad, 12).is_err());
    }

    #[test]
    fn test_aggregate_sales_sums_and_sorts() {
        let sales = aggregate_sales([(1, 2), (2, 1), (1, 3), (3, 5)]);
        assert_eq!(
            sales,
            vec![
                ProductSales {
                    product_id: 1,
                    total_sold: 5
                },
                ProductSales {
                    product_id: 3,
                    total_sold: 5
                },
                ProductSales {
                    product_id: 2,
                    total_sold: 1
                },
            ]
        );
        assert!(aggregate_sales(Vec::new()).is_empty());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=12).collect();
        assert_eq!(paginate(&items, 2, 5), &[6, 7, 8, 9, 10]);
        assert_eq!(paginate(&items, 3, 5), &[11, 12]);
        assert_eq!(paginate(&items, 0, 5), &[1, 2, 3, 4, 5]);
        assert!(paginate(&items, 4, 5).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
    }

    #[tokio::test]
    async fn test_hot_deals_counts_only_paid_orders() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let p1 = create_test_product(&db, store.id, category.id, "Speaker", group.id, 100.0, 50).await?;
        let p2 = create_test_product(&db, store.id, category.id, "Headphones", group.id, 80.0, 50).await?;
        let v1 = first_variant(&db, p1.id).await?;
        let v2 = first_variant(&db, p2.id).await?;

        let now = Utc::now();
        create_test_order(&db, store.id, &[(v1.id, 2, 100.0)], true, now).await?;
        create_test_order(&db, store.id, &[(v1.id, 3, 100.0)], true, now).await?;
        create_test_order(&db, store.id, &[(v2.id, 10, 80.0)], false, now).await?;

        let query = HotDealsQuery::from_params(HotDealsParams::default(), 12)?;
        let deals = hot_deals(&db, store.id, &query, now).await?;
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].product.product.id, p1.id);
        assert_eq!(deals[0].total_sold, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_hot_deals_window_and_category() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let audio = create_test_category(&db, store.id, "Audio").await?;
        let video = create_test_category(&db, store.id, "Video").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let speaker = create_test_product(&db, store.id, audio.id, "Speaker", group.id, 100.0, 50).await?;
        let tv = create_test_product(&db, store.id, video.id, "TV", group.id, 900.0, 50).await?;
        let speaker_variant = first_variant(&db, speaker.id).await?;
        let tv_variant = first_variant(&db, tv.id).await?;

        let now = Utc::now();
        create_test_order(&db, store.id, &[(speaker_variant.id, 1, 100.0)], true, now).await?;
        create_test_order(
            &db,
            store.id,
            &[(tv_variant.id, 4, 900.0)],
            true,
            now - Duration::days(45),
        )
        .await?;

        let recent = HotDealsQuery::from_params(HotDealsParams::default(), 12)?;
        let deals = hot_deals(&db, store.id, &recent, now).await?;
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].product.product.id, speaker.id);

        let all_time = HotDealsQuery::from_params(
            HotDealsParams {
                time_frame: Some("all time".to_string()),
                ..Default::default()
            },
            12,
        )?;
        let deals = hot_deals(&db, store.id, &all_time, now).await?;
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].product.product.id, tv.id);
        assert_eq!(deals[0].total_sold, 4);

        let audio_only = HotDealsQuery {
            category_id: Some(audio.id),
            ..all_time
        };
        let deals = hot_deals(&db, store.id, &audio_only, now).await?;
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].product.product.id, speaker.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_hot_deals_without_orders() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let query = HotDealsQuery::from_params(HotDealsParams::default(), 12)?;
        assert!(hot_deals(&db, store.id, &query, Utc::now()).await?.is_empty());
        Ok(())
    }
}
