//! Orders - checkout and payment confirmation.
//!
//! Checkout prices every line on the server, stores an unpaid order and asks the
//! payment gateway for a payment order. The gateway later calls the webhook, which
//! confirms the payment and takes the ordered units out of stock in one transaction.

use crate::{
    config::CheckoutConfig,
    core::{
        pricing::{resolve_location_group, resolve_price},
        store::ensure_store_exists,
    },
    entities::{
        Order, OrderItem, Product, Variant, VariantPrice, order, order_item, product, variant,
        variant_price,
    },
    errors::{Error, Result},
    payment::{GatewayOrderRequest, PaymentGateway},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub variant_id: i64,
    pub quantity: i32,
}

/// Checkout payload sent by the storefront.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub products: Vec<CheckoutLine>,
    #[serde(default)]
    pub location_group_id: Option<i64>,
    #[serde(default)]
    pub pincode: Option<String>,
}

/// What the storefront needs to open the gateway's checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: i64,
    pub order_number: String,
    pub gateway_order_id: String,
    /// Total in minor units
    pub amount: i64,
    pub currency: String,
    /// Gateway public key id
    pub key: String,
}

/// Result of confirming a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub order: order::Model,
    /// `true` when the order had already been confirmed and nothing changed
    pub already_paid: bool,
}

/// An order with its items and total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub total_price: f64,
}

/// Converts a price in rupees to paise.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Date part of an order number: two-digit year and month, e.g. `"2610"`.
#[must_use]
pub fn order_number_base(now: DateTime<Utc>) -> String {
    now.format("%y%m").to_string()
}

fn order_number_candidate(base: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{base}{suffix:03}")
}

/// Picks an order number that no existing order uses.
///
/// # Errors
/// Returns [`Error::Conflict`] after `max_attempts` collisions.
pub async fn generate_order_number<C>(db: &C, now: DateTime<Utc>, max_attempts: usize) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = order_number_base(now);
    for _ in 0..max_attempts {
        let candidate = order_number_candidate(&base);
        let taken = Order::find()
            .filter(order::Column::OrderNumber.eq(candidate.as_str()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(Error::conflict(format!(
        "Could not allocate an order number for {base} after {max_attempts} attempts"
    )))
}

/// Merges repeated variants, keeping first-seen order.
fn merge_lines(lines: &[CheckoutLine]) -> Result<Vec<(i64, i32)>> {
    if lines.is_empty() {
        return Err(Error::validation("Variant IDs are required"));
    }
    let mut merged: Vec<(i64, i32)> = Vec::new();
    for line in lines {
        if line.quantity < 1 {
            return Err(Error::validation(format!(
                "Quantity for variant {} must be at least 1",
                line.variant_id
            )));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.variant_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
            None => merged.push((line.variant_id, line.quantity)),
        }
    }
    Ok(merged)
}

/// Creates an unpaid order for the requested lines and opens a payment order.
///
/// # Errors
/// - [`Error::Validation`] for an empty cart, bad quantities, variants outside the
///   store or archived, or a zero total
/// - [`Error::InsufficientStock`] when a variant cannot cover its quantity
/// - [`Error::PaymentGateway`] when the gateway refuses the order; the unpaid order
///   stays behind and is never confirmed
#[instrument(skip(db, gateway, config, request))]
pub async fn checkout(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    config: &CheckoutConfig,
    store_id: i64,
    request: CheckoutRequest,
) -> Result<CheckoutResponse> {
    let lines = merge_lines(&request.products)?;
    ensure_store_exists(db, store_id).await?;
    let target_group = resolve_location_group(
        db,
        store_id,
        request.location_group_id,
        request.pincode.as_deref(),
    )
    .await?;

    let ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
    let variants: HashMap<i64, (variant::Model, Option<product::Model>)> =
        Variant::find()
            .filter(variant::Column::Id.is_in(ids.clone()))
            .find_also_related(Product)
            .all(db)
            .await?
            .into_iter()
            .map(|(v, p)| (v.id, (v, p)))
            .collect();
    let mut prices: HashMap<i64, Vec<variant_price::Model>> = HashMap::new();
    for price in VariantPrice::find()
        .filter(variant_price::Column::VariantId.is_in(ids))
        .order_by_asc(variant_price::Column::Id)
        .all(db)
        .await?
    {
        prices.entry(price.variant_id).or_default().push(price);
    }

    let mut priced: Vec<(i64, i32, f64)> = Vec::with_capacity(lines.len());
    let mut amount: i64 = 0;
    for (variant_id, quantity) in lines {
        let Some((variant, Some(product))) = variants.get(&variant_id) else {
            return Err(Error::validation(format!("Variant {variant_id} not found")));
        };
        if product.store_id != store_id || product.is_archived {
            return Err(Error::validation(format!(
                "Variant {variant_id} is not available in this store"
            )));
        }
        if variant.stock < quantity {
            return Err(Error::InsufficientStock {
                variant_id,
                requested: quantity,
                available: variant.stock,
            });
        }
        let unit_price = resolve_price(
            prices.get(&variant_id).map_or(&[][..], Vec::as_slice),
            target_group,
        )
        .price;
        amount += to_minor_units(unit_price) * i64::from(quantity);
        priced.push((variant_id, quantity, unit_price));
    }
    if amount <= 0 {
        return Err(Error::validation("Order total must be greater than zero"));
    }

    let now = Utc::now();
    let order_number = generate_order_number(db, now, config.order_number_max_attempts).await?;

    let txn = db.begin().await?;
    let order = order::ActiveModel {
        store_id: Set(store_id),
        order_number: Set(order_number.clone()),
        is_paid: Set(false),
        address: Set(String::new()),
        phone: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    for (variant_id, quantity, unit_price) in &priced {
        order_item::ActiveModel {
            order_id: Set(order.id),
            variant_id: Set(*variant_id),
            quantity: Set(*quantity),
            unit_price: Set(*unit_price),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    let mut notes = BTreeMap::new();
    notes.insert("orderId".to_string(), order.id.to_string());
    let gateway_order = gateway
        .create_order(GatewayOrderRequest {
            amount,
            currency: config.currency.clone(),
            receipt: order_number.clone(),
            notes,
        })
        .await
        .inspect_err(|e| warn!("Gateway refused order {}: {}", order.id, e))?;

    info!(
        "Checkout created order {} ({}) for {} paise",
        order.id, order_number, amount
    );
    Ok(CheckoutResponse {
        order_id: order.id,
        order_number,
        gateway_order_id: gateway_order.id,
        amount: gateway_order.amount,
        currency: gateway_order.currency,
        key: gateway.key_id().to_string(),
    })
}

/// Marks an order paid and takes its items out of stock.
///
/// Runs in one transaction. Stock is floored at zero. An order that is already
/// paid is returned unchanged, so a redelivered webhook does not decrement twice.
///
/// # Errors
/// Returns [`Error::NotFound`] for an unknown order.
#[instrument(skip(db, address, phone))]
pub async fn confirm_payment(
    db: &DatabaseConnection,
    order_id: i64,
    address: &str,
    phone: &str,
) -> Result<PaymentConfirmation> {
    let txn = db.begin().await?;
    let existing = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))?;
    if existing.is_paid {
        txn.commit().await?;
        info!("Order {} already paid; ignoring repeat confirmation", order_id);
        return Ok(PaymentConfirmation {
            order: existing,
            already_paid: true,
        });
    }

    let mut order: order::ActiveModel = existing.into();
    order.is_paid = Set(true);
    order.address = Set(address.to_string());
    order.phone = Set(phone.to_string());
    order.updated_at = Set(Utc::now());
    let order = order.update(&txn).await?;

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&txn)
        .await?;
    for item in items {
        let Some(current) = Variant::find_by_id(item.variant_id).one(&txn).await? else {
            warn!(
                "Variant {} of order {} no longer exists; stock not adjusted",
                item.variant_id, order_id
            );
            continue;
        };
        let remaining = current.stock.saturating_sub(item.quantity).max(0);
        let mut variant: variant::ActiveModel = current.into();
        variant.stock = Set(remaining);
        variant.update(&txn).await?;
    }
    txn.commit().await?;

    info!("Order {} marked paid", order_id);
    Ok(PaymentConfirmation {
        order,
        already_paid: false,
    })
}

/// Lists the store's orders, newest first, with their items.
pub async fn list_orders(db: &DatabaseConnection, store_id: i64) -> Result<Vec<OrderSummary>> {
    ensure_store_exists(db, store_id).await?;
    let orders = Order::find()
        .filter(order::Column::StoreId.eq(store_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .find_with_related(OrderItem)
        .all(db)
        .await?;
    Ok(orders
        .into_iter()
        .map(|(order, items)| OrderSummary {
            total_price: items
                .iter()
                .map(|i| i.unit_price * f64::from(i.quantity))
                .sum(),
            order,
            items,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{payment::LocalGateway, test_utils::*};
    use chrono::TimeZone;

    fn line(variant_id: i64, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            variant_id,
            quantity,
        }
    }

    fn request(lines: Vec<CheckoutLine>) -> CheckoutRequest {
        CheckoutRequest {
            products: lines,
            location_group_id: None,
            pincode: None,
        }
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(499.99), 49_999);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
        assert_eq!(to_minor_units(0.0), 0);
    }

    #[test]
    fn test_order_number_shape() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap();
        assert_eq!(order_number_base(now), "2603");
        let number = order_number_candidate("2603");
        assert_eq!(number.len(), 7);
        assert!(number.starts_with("2603"));
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_merge_lines() {
        let merged = merge_lines(&[line(3, 1), line(5, 2), line(3, 4)]).unwrap();
        assert_eq!(merged, vec![(3, 5), (5, 2)]);
        assert!(matches!(merge_lines(&[]), Err(Error::Validation { .. })));
        assert!(matches!(
            merge_lines(&[line(3, 0)]),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let db = setup_test_db().await.unwrap();
        let gateway = LocalGateway::new("key");
        let result = checkout(&db, &gateway, &CheckoutConfig::default(), 1, request(vec![])).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_checkout_prices_on_server() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Speaker", group.id, 499.5, 10).await?;
        let variant = first_variant(&db, product.id).await?;
        let gateway = LocalGateway::new("rzp_test");

        let response = checkout(
            &db,
            &gateway,
            &CheckoutConfig::default(),
            store.id,
            request(vec![line(variant.id, 2)]),
        )
        .await?;
        assert_eq!(response.amount, 99_900);
        assert_eq!(response.currency, "INR");
        assert_eq!(response.key, "rzp_test");

        let order = Order::find_by_id(response.order_id).one(&db).await?.unwrap();
        assert!(!order.is_paid);
        assert_eq!(order.order_number, response.order_number);
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&db)
            .await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, 499.5);
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_rejects_missing_or_short_stock() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Speaker", group.id, 100.0, 1).await?;
        let variant = first_variant(&db, product.id).await?;
        let gateway = LocalGateway::new("key");
        let config = CheckoutConfig::default();

        let short = checkout(&db, &gateway, &config, store.id, request(vec![line(variant.id, 2)])).await;
        assert!(matches!(
            short,
            Err(Error::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            })
        ));

        let missing = checkout(&db, &gateway, &config, store.id, request(vec![line(9999, 1)])).await;
        assert!(matches!(missing, Err(Error::Validation { .. })));

        let other = create_test_store(&db, "Other").await?;
        let foreign = checkout(&db, &gateway, &config, other.id, request(vec![line(variant.id, 1)])).await;
        assert!(matches!(foreign, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_rejects_zero_total() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Freebie", group.id, 0.0, 5).await?;
        let variant = first_variant(&db, product.id).await?;

        let result = checkout(
            &db,
            &LocalGateway::new("key"),
            &CheckoutConfig::default(),
            store.id,
            request(vec![line(variant.id, 1)]),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_payment_is_idempotent() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Speaker", group.id, 100.0, 5).await?;
        let variant = first_variant(&db, product.id).await?;
        let order =
            create_test_order(&db, store.id, &[(variant.id, 3, 100.0)], false, Utc::now()).await?;

        let first = confirm_payment(&db, order.id, "12 MG Road", "+919800000000").await?;
        assert!(!first.already_paid);
        assert!(first.order.is_paid);
        assert_eq!(first.order.address, "12 MG Road");

        let second = confirm_payment(&db, order.id, "12 MG Road", "+919800000000").await?;
        assert!(second.already_paid);

        let stock = Variant::find_by_id(variant.id).one(&db).await?.unwrap().stock;
        assert_eq!(stock, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_payment_floors_stock_at_zero() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Speaker", group.id, 100.0, 2).await?;
        let variant = first_variant(&db, product.id).await?;
        let order =
            create_test_order(&db, store.id, &[(variant.id, 5, 100.0)], false, Utc::now()).await?;

        confirm_payment(&db, order.id, "", "").await?;
        let stock = Variant::find_by_id(variant.id).one(&db).await?.unwrap().stock;
        assert_eq!(stock, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_unknown_order() -> Result<()> {
        let db = setup_test_db().await?;
        let result = confirm_payment(&db, 404, "", "").await;
        assert!(matches!(result, Err(Error::NotFound { entity: "order", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_totals() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let product =
            create_test_product(&db, store.id, category.id, "Speaker", group.id, 100.0, 5).await?;
        let variant = first_variant(&db, product.id).await?;
        create_test_order(&db, store.id, &[(variant.id, 2, 150.0)], true, Utc::now()).await?;

        let orders = list_orders(&db, store.id).await?;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].total_price, 300.0);
        Ok(())
    }
}
