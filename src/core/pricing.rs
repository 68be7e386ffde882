//! Variant price resolution.
//!
//! A variant carries one price record per location group. The storefront asks for a
//! price either by location group id or by the pincode of a delivery location; when
//! no record matches, the first record is used, and a variant without any price
//! record resolves to zero instead of failing the request.

use crate::{
    entities::{Location, location, variant_price},
    errors::{Error, Result},
};
use sea_orm::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Resolved selling price and MRP for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PricePair {
    /// Selling price
    pub price: f64,
    /// Maximum retail price
    pub mrp: f64,
}

impl From<&variant_price::Model> for PricePair {
    fn from(record: &variant_price::Model) -> Self {
        Self {
            price: record.price,
            mrp: record.mrp,
        }
    }
}

/// Picks the price record for `target_group`.
///
/// Exact match on `location_group_id` first, then the first record in `prices`,
/// then a zero price when `prices` is empty.
#[must_use]
pub fn resolve_price(prices: &[variant_price::Model], target_group: Option<i64>) -> PricePair {
    target_group
        .and_then(|group_id| prices.iter().find(|p| p.location_group_id == group_id))
        .or_else(|| prices.first())
        .map(PricePair::from)
        .unwrap_or_default()
}

/// Keeps only the records that apply to `target_group`, or all of them when no
/// group was requested.
#[must_use]
pub fn prices_for_group(
    prices: Vec<variant_price::Model>,
    target_group: Option<i64>,
) -> Vec<variant_price::Model> {
    match target_group {
        Some(group_id) => prices
            .into_iter()
            .filter(|p| p.location_group_id == group_id)
            .collect(),
        None => prices,
    }
}

/// Finds a store location by its pincode.
pub async fn find_location_by_pincode<C>(
    db: &C,
    store_id: i64,
    pincode: &str,
) -> Result<Option<location::Model>>
where
    C: ConnectionTrait,
{
    Location::find()
        .filter(location::Column::StoreId.eq(store_id))
        .filter(location::Column::Pincode.eq(pincode.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Works out which location group a storefront request is priced for.
///
/// An explicit `location_group_id` wins. Otherwise a `pincode` is looked up in the
/// store's locations; a location without a group resolves to `None`, which makes
/// [`resolve_price`] fall back to the first price record.
///
/// # Errors
/// Returns [`Error::NotFound`] for a pincode the store does not deliver to.
pub async fn resolve_location_group<C>(
    db: &C,
    store_id: i64,
    location_group_id: Option<i64>,
    pincode: Option<&str>,
) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    if location_group_id.is_some() {
        return Ok(location_group_id);
    }

    let Some(pincode) = pincode.filter(|p| !p.trim().is_empty()) else {
        return Ok(None);
    };

    let location = find_location_by_pincode(db, store_id, pincode)
        .await?
        .ok_or_else(|| Error::not_found("pincode", pincode))?;
    debug!(
        "Pincode {} resolved to location {} (group {:?})",
        pincode, location.id, location.location_group_id
    );
    Ok(location.location_group_id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn price(id: i64, group: i64, price: f64, mrp: f64) -> variant_price::Model {
        variant_price::Model {
            id,
            variant_id: 1,
            location_group_id: group,
            price,
            mrp,
        }
    }

    #[test]
    fn test_resolve_price_exact_match() {
        let prices = vec![price(1, 10, 100.0, 120.0), price(2, 20, 150.0, 180.0)];
        let resolved = resolve_price(&prices, Some(20));
        assert_eq!(resolved.price, 150.0);
        assert_eq!(resolved.mrp, 180.0);
    }

    #[test]
    fn test_resolve_price_unmatched_falls_back_to_first() {
        let prices = vec![price(1, 10, 100.0, 120.0), price(2, 20, 150.0, 180.0)];
        assert_eq!(resolve_price(&prices, Some(30)).price, 100.0);
        assert_eq!(resolve_price(&prices, None).price, 100.0);
    }

    #[test]
    fn test_resolve_price_empty_is_zero() {
        let resolved = resolve_price(&[], Some(10));
        assert_eq!(resolved, PricePair::default());
        assert_eq!(resolved.price, 0.0);
        assert_eq!(resolved.mrp, 0.0);
    }

    #[test]
    fn test_prices_for_group_filters() {
        let prices = vec![price(1, 10, 100.0, 120.0), price(2, 20, 150.0, 180.0)];
        let filtered = prices_for_group(prices.clone(), Some(20));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);
        assert_eq!(prices_for_group(prices, None).len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_location_group_explicit_id_wins() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let resolved = resolve_location_group(&db, store.id, Some(5), Some("000000")).await?;
        assert_eq!(resolved, Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_location_group_by_pincode() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        create_test_location(&db, store.id, "110001", Some(group.id)).await?;
        create_test_location(&db, store.id, "560001", None).await?;

        let resolved = resolve_location_group(&db, store.id, None, Some("110001")).await?;
        assert_eq!(resolved, Some(group.id));

        let ungrouped = resolve_location_group(&db, store.id, None, Some("560001")).await?;
        assert_eq!(ungrouped, None);

        let nothing = resolve_location_group(&db, store.id, None, None).await?;
        assert_eq!(nothing, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_location_group_unknown_pincode_is_not_found() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let result = resolve_location_group(&db, store.id, None, Some("999999")).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "pincode",
                ..
            })
        ));
        Ok(())
    }
}
