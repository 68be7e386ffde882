//! Category business logic - Top level of the catalog hierarchy.
//!
//! Categories own a tree of sub-categories; listing a category returns that tree
//! nested to the configured depth.

use crate::{
    core::{
        slug::{SlugKind, generate_unique_slug},
        store::ensure_store_exists,
        tree::{SubCategoryNode, build_tree},
    },
    entities::{Category, Product, SubCategory, category, product, sub_category},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Fields accepted when creating or updating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    /// Display name; the slug is derived from it
    pub name: String,
    /// Optional banner image URL
    #[serde(default)]
    pub banner_image: Option<String>,
}

/// A category together with its nested sub-category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTree {
    #[serde(flatten)]
    pub category: category::Model,
    pub sub_categories: Vec<SubCategoryNode>,
}

fn validate_input(input: &CategoryInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    Ok(())
}

/// Loads a category that belongs to `store_id`.
pub async fn find_category<C>(db: &C, store_id: i64, category_id: i64) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .filter(category::Column::StoreId.eq(store_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))
}

/// Creates a category with a slug generated from its name.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(
    db: &DatabaseConnection,
    store_id: i64,
    input: CategoryInput,
    slug_max_attempts: usize,
) -> Result<category::Model> {
    validate_input(&input)?;
    ensure_store_exists(db, store_id).await?;

    let name = input.name.trim().to_string();
    let slug = generate_unique_slug(
        db,
        SlugKind::Category,
        store_id,
        &name,
        None,
        slug_max_attempts,
    )
    .await?;

    let now = chrono::Utc::now().naive_utc();
    let category = category::ActiveModel {
        store_id: Set(store_id),
        name: Set(name),
        slug: Set(slug),
        banner_image: Set(input.banner_image),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let category = category.insert(db).await?;
    info!("Created category {} ({})", category.id, category.slug);
    Ok(category)
}

/// Updates a category, regenerating its slug when the name changes.
#[instrument(skip(db, input))]
pub async fn update_category(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: i64,
    input: CategoryInput,
    slug_max_attempts: usize,
) -> Result<category::Model> {
    validate_input(&input)?;
    ensure_store_exists(db, store_id).await?;
    let existing = find_category(db, store_id, category_id).await?;

    let name = input.name.trim().to_string();
    let slug = if name == existing.name && !existing.slug.is_empty() {
        existing.slug.clone()
    } else {
        generate_unique_slug(
            db,
            SlugKind::Category,
            store_id,
            &name,
            Some(category_id),
            slug_max_attempts,
        )
        .await?
    };

    let mut category: category::ActiveModel = existing.into();
    category.name = Set(name);
    category.slug = Set(slug);
    category.banner_image = Set(input.banner_image);
    category.updated_at = Set(chrono::Utc::now().naive_utc());
    category.update(db).await.map_err(Into::into)
}

/// Retrieves a category with its sub-category tree.
pub async fn get_category(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: i64,
    tree_depth: usize,
) -> Result<CategoryTree> {
    ensure_store_exists(db, store_id).await?;
    let category = find_category(db, store_id, category_id).await?;
    let subs = SubCategory::find()
        .filter(sub_category::Column::CategoryId.eq(category_id))
        .order_by_asc(sub_category::Column::Id)
        .all(db)
        .await?;
    Ok(CategoryTree {
        category,
        sub_categories: build_tree(&subs, tree_depth),
    })
}

/// Attaches sub-category trees to already-fetched categories with one query.
pub async fn attach_trees<C>(
    db: &C,
    categories: Vec<category::Model>,
    tree_depth: usize,
) -> Result<Vec<CategoryTree>>
where
    C: ConnectionTrait,
{
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let subs = SubCategory::find()
        .filter(sub_category::Column::CategoryId.is_in(ids))
        .order_by_asc(sub_category::Column::Id)
        .all(db)
        .await?;

    Ok(categories
        .into_iter()
        .map(|category| {
            let own: Vec<sub_category::Model> = subs
                .iter()
                .filter(|s| s.category_id == category.id)
                .cloned()
                .collect();
            CategoryTree {
                sub_categories: build_tree(&own, tree_depth),
                category,
            }
        })
        .collect())
}

/// Lists the store's categories, newest first, each with its sub-category tree.
pub async fn list_categories(
    db: &DatabaseConnection,
    store_id: i64,
    tree_depth: usize,
) -> Result<Vec<CategoryTree>> {
    ensure_store_exists(db, store_id).await?;
    let categories = Category::find()
        .filter(category::Column::StoreId.eq(store_id))
        .order_by_desc(category::Column::CreatedAt)
        .order_by_desc(category::Column::Id)
        .all(db)
        .await?;
    attach_trees(db, categories, tree_depth).await
}

/// Deletes a category that nothing references any more.
///
/// # Errors
/// Returns [`Error::Conflict`] while products or sub-categories still point at it.
#[instrument(skip(db))]
pub async fn delete_category(
    db: &DatabaseConnection,
    store_id: i64,
    category_id: i64,
) -> Result<category::Model> {
    ensure_store_exists(db, store_id).await?;
    let category = find_category(db, store_id, category_id).await?;

    let products = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    if products > 0 {
        return Err(Error::conflict(format!(
            "Category is used by {products} product(s); remove them first"
        )));
    }
    let subs = SubCategory::find()
        .filter(sub_category::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    if subs > 0 {
        return Err(Error::conflict(format!(
            "Category has {subs} sub-categories; remove them first"
        )));
    }

    Category::delete_by_id(category_id).exec(db).await?;
    info!("Deleted category {}", category_id);
    Ok(category)
}
