//! Brand business logic.

use crate::{
    core::{
        slug::{SlugKind, generate_unique_slug},
        store::ensure_store_exists,
    },
    entities::{Brand, Product, brand, product},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Fields accepted when creating or updating a brand.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandInput {
    pub name: String,
}

/// Loads a brand that belongs to `store_id`.
pub async fn find_brand<C>(db: &C, store_id: i64, brand_id: i64) -> Result<brand::Model>
where
    C: ConnectionTrait,
{
    Brand::find_by_id(brand_id)
        .filter(brand::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("brand", brand_id))
}

/// Creates a brand with a generated slug.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_brand(
    db: &DatabaseConnection,
    store_id: i64,
    input: BrandInput,
    slug_max_attempts: usize,
) -> Result<brand::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    ensure_store_exists(db, store_id).await?;

    let name = input.name.trim().to_string();
    let slug =
        generate_unique_slug(db, SlugKind::Brand, store_id, &name, None, slug_max_attempts).await?;
    let now = chrono::Utc::now().naive_utc();
    let brand = brand::ActiveModel {
        store_id: Set(store_id),
        name: Set(name),
        slug: Set(slug),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let brand = brand.insert(db).await?;
    info!("Created brand {} ({})", brand.id, brand.slug);
    Ok(brand)
}

/// Renames a brand; the slug follows the name.
#[instrument(skip(db, input))]
pub async fn update_brand(
    db: &DatabaseConnection,
    store_id: i64,
    brand_id: i64,
    input: BrandInput,
    slug_max_attempts: usize,
) -> Result<brand::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    ensure_store_exists(db, store_id).await?;
    let existing = find_brand(db, store_id, brand_id).await?;

    let name = input.name.trim().to_string();
    if name == existing.name && !existing.slug.is_empty() {
        return Ok(existing);
    }
    let slug = generate_unique_slug(
        db,
        SlugKind::Brand,
        store_id,
        &name,
        Some(brand_id),
        slug_max_attempts,
    )
    .await?;

    let mut brand: brand::ActiveModel = existing.into();
    brand.name = Set(name);
    brand.slug = Set(slug);
    brand.updated_at = Set(chrono::Utc::now().naive_utc());
    brand.update(db).await.map_err(Into::into)
}

pub async fn get_brand(db: &DatabaseConnection, store_id: i64, brand_id: i64) -> Result<brand::Model> {
    ensure_store_exists(db, store_id).await?;
    find_brand(db, store_id, brand_id).await
}

/// Lists the store's brands alphabetically.
pub async fn list_brands(db: &DatabaseConnection, store_id: i64) -> Result<Vec<brand::Model>> {
    ensure_store_exists(db, store_id).await?;
    Brand::find()
        .filter(brand::Column::StoreId.eq(store_id))
        .order_by_asc(brand::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a brand that no product uses.
#[instrument(skip(db))]
pub async fn delete_brand(db: &DatabaseConnection, store_id: i64, brand_id: i64) -> Result<brand::Model> {
    ensure_store_exists(db, store_id).await?;
    let brand = find_brand(db, store_id, brand_id).await?;

    let products = Product::find()
        .filter(product::Column::BrandId.eq(brand_id))
        .count(db)
        .await?;
    if products > 0 {
        return Err(Error::conflict(format!(
            "Brand is used by {products} product(s); remove them first"
        )));
    }

    Brand::delete_by_id(brand_id).exec(db).await?;
    info!("Deleted brand {}", brand_id);
    Ok(brand)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(name: &str) -> BrandInput {
        BrandInput {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_brand_validation() {
        let db = setup_test_db().await.unwrap();
        let result = create_brand(&db, 1, input(""), 100).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn test_brand_crud() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let brand = create_brand(&db, store.id, input("Acme Audio"), 100).await?;
        assert_eq!(brand.slug, "acme-audio");

        let renamed = update_brand(&db, store.id, brand.id, input("Acme"), 100).await?;
        assert_eq!(renamed.slug, "acme");

        let listed = list_brands(&db, store.id).await?;
        assert_eq!(listed.len(), 1);

        delete_brand(&db, store.id, brand.id).await?;
        let result = get_brand(&db, store.id, brand.id).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "brand", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_brand_in_use() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Audio").await?;
        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let brand = create_brand(&db, store.id, input("Acme"), 100).await?;

        let mut product = product_input(category.id, "Speaker", group.id, 999.0, 5);
        product.brand_id = Some(brand.id);
        crate::core::product::create_product(&db, store.id, product, 100).await?;

        let result = delete_brand(&db, store.id, brand.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));
        Ok(())
    }
}
