//! Delivery locations and the location groups that scope variant prices.
//!
//! A location is one serviceable pincode. Locations that share a price book point
//! at the same [`location_group`]; variant prices are stored per group.

use crate::{
    core::store::ensure_store_exists,
    entities::{Location, LocationGroup, VariantPrice, location, location_group, variant_price},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGroupInput {
    pub name: String,
}

/// Fields accepted when creating or updating a location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub pincode: String,
    pub city: String,
    pub state: String,
    pub country: String,
    #[serde(default)]
    pub is_cod_available: bool,
    pub delivery_days: i32,
    #[serde(default)]
    pub location_group_id: Option<i64>,
}

/// Storefront answer to "do you deliver to this pincode?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub pincode: String,
    pub city: String,
    pub state: String,
    pub is_cod_available: bool,
    pub delivery_days: i32,
    pub location_group_id: Option<i64>,
}

impl From<location::Model> for DeliveryInfo {
    fn from(location: location::Model) -> Self {
        Self {
            pincode: location.pincode,
            city: location.city,
            state: location.state,
            is_cod_available: location.is_cod_available,
            delivery_days: location.delivery_days,
            location_group_id: location.location_group_id,
        }
    }
}

/// Loads a location group that belongs to `store_id`.
pub async fn find_location_group<C>(
    db: &C,
    store_id: i64,
    group_id: i64,
) -> Result<location_group::Model>
where
    C: ConnectionTrait,
{
    LocationGroup::find_by_id(group_id)
        .filter(location_group::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("location group", group_id))
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_location_group(
    db: &DatabaseConnection,
    store_id: i64,
    input: LocationGroupInput,
) -> Result<location_group::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    ensure_store_exists(db, store_id).await?;

    let group = location_group::ActiveModel {
        store_id: Set(store_id),
        name: Set(input.name.trim().to_string()),
        ..Default::default()
    };
    group.insert(db).await.map_err(Into::into)
}

pub async fn list_location_groups(
    db: &DatabaseConnection,
    store_id: i64,
) -> Result<Vec<location_group::Model>> {
    ensure_store_exists(db, store_id).await?;
    LocationGroup::find()
        .filter(location_group::Column::StoreId.eq(store_id))
        .order_by_asc(location_group::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a location group that no location or price references.
#[instrument(skip(db))]
pub async fn delete_location_group(
    db: &DatabaseConnection,
    store_id: i64,
    group_id: i64,
) -> Result<location_group::Model> {
    ensure_store_exists(db, store_id).await?;
    let group = find_location_group(db, store_id, group_id).await?;

    let locations = Location::find()
        .filter(location::Column::LocationGroupId.eq(group_id))
        .count(db)
        .await?;
    let prices = VariantPrice::find()
        .filter(variant_price::Column::LocationGroupId.eq(group_id))
        .count(db)
        .await?;
    if locations > 0 || prices > 0 {
        return Err(Error::conflict(format!(
            "Location group is used by {locations} location(s) and {prices} price(s)"
        )));
    }

    LocationGroup::delete_by_id(group_id).exec(db).await?;
    info!("Deleted location group {}", group_id);
    Ok(group)
}

/// Checks a location payload and its group; returns the trimmed pincode.
async fn validate_location(
    db: &DatabaseConnection,
    store_id: i64,
    input: &LocationInput,
    exclude_id: Option<i64>,
) -> Result<String> {
    let pincode = input.pincode.trim();
    if pincode.is_empty() {
        return Err(Error::validation("Pincode is required"));
    }
    if input.city.trim().is_empty() {
        return Err(Error::validation("City is required"));
    }
    if input.state.trim().is_empty() {
        return Err(Error::validation("State is required"));
    }
    if input.country.trim().is_empty() {
        return Err(Error::validation("Country is required"));
    }
    if input.delivery_days < 1 {
        return Err(Error::validation("Delivery days must be at least 1"));
    }

    let mut duplicate = Location::find()
        .filter(location::Column::StoreId.eq(store_id))
        .filter(location::Column::Pincode.eq(pincode));
    if let Some(id) = exclude_id {
        duplicate = duplicate.filter(location::Column::Id.ne(id));
    }
    if duplicate.count(db).await? > 0 {
        return Err(Error::conflict(format!(
            "Location with pincode {pincode} already exists"
        )));
    }

    if let Some(group_id) = input.location_group_id {
        find_location_group(db, store_id, group_id).await?;
    }
    Ok(pincode.to_string())
}

/// Loads a location that belongs to `store_id`.
pub async fn find_location<C>(db: &C, store_id: i64, location_id: i64) -> Result<location::Model>
where
    C: ConnectionTrait,
{
    Location::find_by_id(location_id)
        .filter(location::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("location", location_id))
}

#[instrument(skip(db, input), fields(pincode = %input.pincode))]
pub async fn create_location(
    db: &DatabaseConnection,
    store_id: i64,
    input: LocationInput,
) -> Result<location::Model> {
    ensure_store_exists(db, store_id).await?;
    let pincode = validate_location(db, store_id, &input, None).await?;

    let location = location::ActiveModel {
        store_id: Set(store_id),
        pincode: Set(pincode),
        city: Set(input.city.trim().to_string()),
        state: Set(input.state.trim().to_string()),
        country: Set(input.country.trim().to_string()),
        is_cod_available: Set(input.is_cod_available),
        delivery_days: Set(input.delivery_days),
        location_group_id: Set(input.location_group_id),
        ..Default::default()
    };
    let location = location.insert(db).await?;
    info!("Created location {} for pincode {}", location.id, location.pincode);
    Ok(location)
}

#[instrument(skip(db, input))]
pub async fn update_location(
    db: &DatabaseConnection,
    store_id: i64,
    location_id: i64,
    input: LocationInput,
) -> Result<location::Model> {
    ensure_store_exists(db, store_id).await?;
    let existing = find_location(db, store_id, location_id).await?;
    let pincode = validate_location(db, store_id, &input, Some(location_id)).await?;

    let mut location: location::ActiveModel = existing.into();
    location.pincode = Set(pincode);
    location.city = Set(input.city.trim().to_string());
    location.state = Set(input.state.trim().to_string());
    location.country = Set(input.country.trim().to_string());
    location.is_cod_available = Set(input.is_cod_available);
    location.delivery_days = Set(input.delivery_days);
    location.location_group_id = Set(input.location_group_id);
    location.update(db).await.map_err(Into::into)
}

pub async fn get_location(
    db: &DatabaseConnection,
    store_id: i64,
    location_id: i64,
) -> Result<location::Model> {
    ensure_store_exists(db, store_id).await?;
    find_location(db, store_id, location_id).await
}

/// Lists the store's locations ordered by pincode.
pub async fn list_locations(db: &DatabaseConnection, store_id: i64) -> Result<Vec<location::Model>> {
    ensure_store_exists(db, store_id).await?;
    Location::find()
        .filter(location::Column::StoreId.eq(store_id))
        .order_by_asc(location::Column::Pincode)
        .all(db)
        .await
        .map_err(Into::into)
}

#[instrument(skip(db))]
pub async fn delete_location(
    db: &DatabaseConnection,
    store_id: i64,
    location_id: i64,
) -> Result<location::Model> {
    ensure_store_exists(db, store_id).await?;
    let location = find_location(db, store_id, location_id).await?;
    Location::delete_by_id(location_id).exec(db).await?;
    info!("Deleted location {}", location_id);
    Ok(location)
}

/// Looks up delivery details for a pincode.
///
/// # Errors
/// Returns [`Error::NotFound`] when the store does not deliver to `pincode`.
pub async fn lookup_pincode(
    db: &DatabaseConnection,
    store_id: i64,
    pincode: &str,
) -> Result<DeliveryInfo> {
    ensure_store_exists(db, store_id).await?;
    let location = crate::core::pricing::find_location_by_pincode(db, store_id, pincode)
        .await?
        .ok_or_else(|| Error::not_found("pincode", pincode))?;
    debug!("Pincode {} is served by location {}", pincode, location.id);
    Ok(location.into())
}
