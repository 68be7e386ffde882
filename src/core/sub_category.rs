//! Sub-category business logic.
//!
//! Sub-categories nest under a category and optionally under another sub-category of
//! the same category. Every write that sets a parent walks the parent chain first so
//! a cycle can never be stored.

use crate::{
    core::{
        category::find_category,
        slug::{SlugKind, generate_unique_slug},
        store::ensure_store_exists,
        tree::{breadcrumb, breadcrumbs, is_valid_parent},
    },
    entities::{Product, SubCategory, product, sub_category},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Fields accepted when creating or updating a sub-category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryInput {
    pub name: String,
    pub category_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub banner_image: Option<String>,
}

/// A sub-category with its breadcrumb, e.g. `"Phones > Android"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryWithName {
    #[serde(flatten)]
    pub sub_category: sub_category::Model,
    pub display_name: String,
}

async fn store_sub_categories<C>(db: &C, store_id: i64) -> Result<Vec<sub_category::Model>>
where
    C: ConnectionTrait,
{
    SubCategory::find()
        .filter(sub_category::Column::StoreId.eq(store_id))
        .order_by_asc(sub_category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a sub-category that belongs to `store_id`.
pub async fn find_sub_category<C>(
    db: &C,
    store_id: i64,
    sub_category_id: i64,
) -> Result<sub_category::Model>
where
    C: ConnectionTrait,
{
    SubCategory::find_by_id(sub_category_id)
        .filter(sub_category::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("sub-category", sub_category_id))
}

/// Checks the category and parent of a sub-category write.
///
/// `child_id` is the sub-category being updated, `None` on create.
async fn validate_placement(
    db: &DatabaseConnection,
    store_id: i64,
    input: &SubCategoryInput,
    child_id: Option<i64>,
) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    find_category(db, store_id, input.category_id).await?;

    let Some(parent_id) = input.parent_id else {
        return Ok(());
    };
    let parent = SubCategory::find_by_id(parent_id)
        .filter(sub_category::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("parent sub-category", parent_id))?;
    if parent.category_id != input.category_id {
        return Err(Error::validation(
            "Parent sub-category must belong to the same category",
        ));
    }

    let subs = store_sub_categories(db, store_id).await?;
    if !is_valid_parent(&subs, child_id, parent_id) {
        warn!(
            "Rejected parent {} for sub-category {:?}: would create a cycle",
            parent_id, child_id
        );
        return Err(Error::validation(
            "Invalid parent sub-category: would create a cycle",
        ));
    }
    Ok(())
}

/// Refuses with [`Error::Conflict`] while products or child sub-categories point at
/// the sub-category.
async fn ensure_unreferenced(
    db: &DatabaseConnection,
    sub_category_id: i64,
    remedy: &str,
) -> Result<()> {
    let products = Product::find()
        .filter(product::Column::SubCategoryId.eq(sub_category_id))
        .count(db)
        .await?;
    if products > 0 {
        return Err(Error::conflict(format!(
            "Sub-category is used by {products} product(s); {remedy}"
        )));
    }
    let children = SubCategory::find()
        .filter(sub_category::Column::ParentId.eq(sub_category_id))
        .count(db)
        .await?;
    if children > 0 {
        return Err(Error::conflict(format!(
            "Sub-category has {children} child sub-categories; {remedy}"
        )));
    }
    Ok(())
}

/// Creates a sub-category.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_sub_category(
    db: &DatabaseConnection,
    store_id: i64,
    input: SubCategoryInput,
    slug_max_attempts: usize,
) -> Result<sub_category::Model> {
    ensure_store_exists(db, store_id).await?;
    validate_placement(db, store_id, &input, None).await?;

    let name = input.name.trim().to_string();
    let slug = generate_unique_slug(
        db,
        SlugKind::SubCategory,
        store_id,
        &name,
        None,
        slug_max_attempts,
    )
    .await?;

    let now = chrono::Utc::now().naive_utc();
    let sub = sub_category::ActiveModel {
        store_id: Set(store_id),
        category_id: Set(input.category_id),
        parent_id: Set(input.parent_id),
        name: Set(name),
        slug: Set(slug),
        banner_image: Set(input.banner_image),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let sub = sub.insert(db).await?;
    info!("Created sub-category {} ({})", sub.id, sub.slug);
    Ok(sub)
}

/// Updates a sub-category's name, category, parent and banner.
#[instrument(skip(db, input))]
pub async fn update_sub_category(
    db: &DatabaseConnection,
    store_id: i64,
    sub_category_id: i64,
    input: SubCategoryInput,
    slug_max_attempts: usize,
) -> Result<sub_category::Model> {
    ensure_store_exists(db, store_id).await?;
    let existing = find_sub_category(db, store_id, sub_category_id).await?;
    validate_placement(db, store_id, &input, Some(sub_category_id)).await?;
    if input.category_id != existing.category_id {
        ensure_unreferenced(db, sub_category_id, "its category cannot change").await?;
    }

    let name = input.name.trim().to_string();
    let slug = if name == existing.name && !existing.slug.is_empty() {
        existing.slug.clone()
    } else {
        generate_unique_slug(
            db,
            SlugKind::SubCategory,
            store_id,
            &name,
            Some(sub_category_id),
            slug_max_attempts,
        )
        .await?
    };

    let mut sub: sub_category::ActiveModel = existing.into();
    sub.name = Set(name);
    sub.slug = Set(slug);
    sub.category_id = Set(input.category_id);
    sub.parent_id = Set(input.parent_id);
    sub.banner_image = Set(input.banner_image);
    sub.updated_at = Set(chrono::Utc::now().naive_utc());
    sub.update(db).await.map_err(Into::into)
}

/// Retrieves a sub-category with its breadcrumb display name.
pub async fn get_sub_category(
    db: &DatabaseConnection,
    store_id: i64,
    sub_category_id: i64,
) -> Result<SubCategoryWithName> {
    ensure_store_exists(db, store_id).await?;
    let sub = find_sub_category(db, store_id, sub_category_id).await?;
    let subs = store_sub_categories(db, store_id).await?;
    Ok(SubCategoryWithName {
        display_name: breadcrumb(&subs, sub.id)?,
        sub_category: sub,
    })
}

/// Lists the store's sub-categories, optionally narrowed to one category, each with
/// its breadcrumb.
pub async fn list_sub_categories(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: Option<i64>,
) -> Result<Vec<SubCategoryWithName>> {
    ensure_store_exists(db, store_id).await?;
    let subs = store_sub_categories(db, store_id).await?;
    let mut names: HashMap<i64, String> = breadcrumbs(&subs)?.into_iter().collect();

    Ok(subs
        .into_iter()
        .filter(|s| category_id.is_none_or(|c| s.category_id == c))
        .map(|sub| SubCategoryWithName {
            display_name: names.remove(&sub.id).unwrap_or_else(|| sub.name.clone()),
            sub_category: sub,
        })
        .collect())
}

/// Deletes a sub-category with no products and no children.
#[instrument(skip(db))]
pub async fn delete_sub_category(
    db: &DatabaseConnection,
    store_id: i64,
    sub_category_id: i64,
) -> Result<sub_category::Model> {
    ensure_store_exists(db, store_id).await?;
    let sub = find_sub_category(db, store_id, sub_category_id).await?;

    ensure_unreferenced(db, sub_category_id, "remove them first").await?;

    SubCategory::delete_by_id(sub_category_id).exec(db).await?;
    info!("Deleted sub-category {}", sub_category_id);
    Ok(sub)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(name: &str, category_id: i64, parent_id: Option<i64>) -> SubCategoryInput {
        SubCategoryInput {
            name: name.to_string(),
            category_id,
            parent_id,
            banner_image: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_breadcrumbs() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Electronics").await?;
        let phones = create_sub_category(&db, store.id, input("Phones", category.id, None), 100).await?;
        let android = create_sub_category(
            &db,
            store.id,
            input("Android", category.id, Some(phones.id)),
            100,
        )
        .await?;

        let fetched = get_sub_category(&db, store.id, android.id).await?;
        assert_eq!(fetched.display_name, "Phones > Android");

        let listed = list_sub_categories(&db, store.id, Some(category.id)).await?;
        let names: Vec<&str> = listed.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["Phones", "Phones > Android"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_parent_must_share_category() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let electronics = create_test_category(&db, store.id, "Electronics").await?;
        let fashion = create_test_category(&db, store.id, "Fashion").await?;
        let phones = create_test_sub_category(&db, store.id, electronics.id, None, "Phones").await?;

        let result = create_sub_category(
            &db,
            store.id,
            input("Shirts", fashion.id, Some(phones.id)),
            100,
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_parent_is_not_found() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Electronics").await?;
        let result =
            create_sub_category(&db, store.id, input("Phones", category.id, Some(77)), 100).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_cycles() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Electronics").await?;
        let a = create_test_sub_category(&db, store.id, category.id, None, "A").await?;
        let b = create_test_sub_category(&db, store.id, category.id, Some(a.id), "B").await?;
        let c = create_test_sub_category(&db, store.id, category.id, Some(b.id), "C").await?;

        let self_parent =
            update_sub_category(&db, store.id, a.id, input("A", category.id, Some(a.id)), 100).await;
        assert!(matches!(self_parent, Err(Error::Validation { .. })));

        let loop_back =
            update_sub_category(&db, store.id, a.id, input("A", category.id, Some(c.id)), 100).await;
        assert!(matches!(loop_back, Err(Error::Validation { .. })));

        let moved =
            update_sub_category(&db, store.id, c.id, input("C", category.id, Some(a.id)), 100).await?;
        assert_eq!(moved.parent_id, Some(a.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_category_move_refused_while_referenced() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let electronics = create_test_category(&db, store.id, "Electronics").await?;
        let fashion = create_test_category(&db, store.id, "Fashion").await?;
        let phones =
            create_test_sub_category(&db, store.id, electronics.id, None, "Phones").await?;
        let android =
            create_test_sub_category(&db, store.id, electronics.id, Some(phones.id), "Android")
                .await?;

        let with_child =
            update_sub_category(&db, store.id, phones.id, input("Phones", fashion.id, None), 100)
                .await;
        assert!(matches!(with_child, Err(Error::Conflict { .. })));
        let child = find_sub_category(&db, store.id, android.id).await?;
        assert_eq!(child.category_id, electronics.id);

        let group = create_test_location_group(&db, store.id, "Metro").await?;
        let mut product = product_input(electronics.id, "Pixel", group.id, 100.0, 1);
        product.sub_category_id = Some(android.id);
        crate::core::product::create_product(&db, store.id, product, 100).await?;
        let with_product = update_sub_category(
            &db,
            store.id,
            android.id,
            input("Android", fashion.id, None),
            100,
        )
        .await;
        assert!(matches!(with_product, Err(Error::Conflict { .. })));

        let renamed = update_sub_category(
            &db,
            store.id,
            phones.id,
            input("Mobiles", electronics.id, None),
            100,
        )
        .await?;
        assert_eq!(renamed.category_id, electronics.id);

        let empty = create_test_sub_category(&db, store.id, electronics.id, None, "Misc").await?;
        let moved =
            update_sub_category(&db, store.id, empty.id, input("Misc", fashion.id, None), 100)
                .await?;
        assert_eq!(moved.category_id, fashion.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_refused_with_children() -> Result<()> {
        let (db, store) = setup_with_store().await?;
        let category = create_test_category(&db, store.id, "Electronics").await?;
        let parent = create_test_sub_category(&db, store.id, category.id, None, "Phones").await?;
        let child =
            create_test_sub_category(&db, store.id, category.id, Some(parent.id), "Android").await?;

        let result = delete_sub_category(&db, store.id, parent.id).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        delete_sub_category(&db, store.id, child.id).await?;
        delete_sub_category(&db, store.id, parent.id).await?;
        assert!(list_sub_categories(&db, store.id, None).await?.is_empty());
        Ok(())
    }
}
