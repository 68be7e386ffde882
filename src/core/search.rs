//! Storefront search across brands, categories, sub-categories and products.
//!
//! Matching is a case-insensitive substring match on names. The requested limit is
//! split four ways: brands, categories and sub-categories each get a quarter
//! rounded down, products get a quarter rounded up.

use crate::{
    core::{
        category::{CategoryTree, attach_trees},
        product_view::{ProductView, load_product_views},
        store::ensure_store_exists,
        tree::{SubCategoryNode, breadcrumb, build_tree},
    },
    entities::{Brand, Category, Product, SubCategory, brand, category, product, sub_category},
    errors::{Error, Result},
};
use sea_orm::{
    QueryOrder, QuerySelect,
    prelude::*,
    sea_query::{Func, LikeExpr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub brand_name: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Per-section result caps derived from the overall limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLimits {
    pub brands: u64,
    pub categories: u64,
    pub sub_categories: u64,
    pub products: u64,
}

impl SectionLimits {
    #[must_use]
    pub const fn split(limit: u64) -> Self {
        let quarter = limit / 4;
        Self {
            brands: quarter,
            categories: quarter,
            sub_categories: quarter,
            products: limit.div_ceil(4),
        }
    }
}

/// A matching sub-category with its breadcrumb and subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryMatch {
    #[serde(flatten)]
    pub node: SubCategoryNode,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPagination {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub brands: Vec<brand::Model>,
    pub categories: Vec<CategoryTree>,
    pub sub_categories: Vec<SubCategoryMatch>,
    pub products: Vec<ProductView>,
    pub pagination: SearchPagination,
}

/// `LOWER(column) LIKE '%query%'` with `%` and `_` in the query taken literally.
fn name_contains<C>(column: C, query: &str) -> SimpleExpr
where
    C: ColumnTrait,
{
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Expr::expr(Func::lower(Expr::col((column.entity_name(), column))))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

/// Picks sub-categories whose own name matches, or that have a matching descendant
/// within `depth` levels, keeping input order.
#[must_use]
pub fn matching_sub_categories(
    subs: &[sub_category::Model],
    query: &str,
    depth: usize,
) -> Vec<i64> {
    let needle = query.to_lowercase();
    let by_id: HashMap<i64, &sub_category::Model> = subs.iter().map(|s| (s.id, s)).collect();
    let mut selected: HashSet<i64> = HashSet::new();

    for sub in subs
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&needle))
    {
        selected.insert(sub.id);
        let mut cursor = sub.parent_id;
        // At most `depth` ancestors
        for _ in 0..depth {
            let Some(parent) = cursor.and_then(|id| by_id.get(&id)) else {
                break;
            };
            selected.insert(parent.id);
            cursor = parent.parent_id;
        }
    }

    subs.iter()
        .map(|s| s.id)
        .filter(|id| selected.contains(id))
        .collect()
}

/// `root` and its descendants, each visited once.
fn subtree(subs: &[sub_category::Model], root: i64) -> Vec<sub_category::Model> {
    let mut children: HashMap<i64, Vec<&sub_category::Model>> = HashMap::new();
    for sub in subs {
        if let Some(parent_id) = sub.parent_id {
            children.entry(parent_id).or_default().push(sub);
        }
    }
    let mut seen = HashSet::from([root]);
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for child in children.get(&current).into_iter().flatten() {
            if seen.insert(child.id) {
                stack.push(child.id);
            }
        }
    }
    subs.iter().filter(|s| seen.contains(&s.id)).cloned().collect()
}

/// Searches the store's catalog.
///
/// # Errors
/// - [`Error::Validation`] for an empty query
/// - [`Error::NotFound`] when `brand_name` names no brand of the store
#[instrument(skip(db))]
pub async fn search(
    db: &DatabaseConnection,
    store_id: i64,
    params: &SearchParams,
    default_limit: u64,
    tree_depth: usize,
) -> Result<SearchResults> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::validation("Search query is required"))?;
    ensure_store_exists(db, store_id).await?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(default_limit);
    let limits = SectionLimits::split(limit);

    let brands = Brand::find()
        .filter(brand::Column::StoreId.eq(store_id))
        .filter(name_contains(brand::Column::Name, query))
        .order_by_asc(brand::Column::Name)
        .limit(limits.brands)
        .all(db)
        .await?;

    let categories = Category::find()
        .filter(category::Column::StoreId.eq(store_id))
        .filter(name_contains(category::Column::Name, query))
        .order_by_asc(category::Column::Name)
        .limit(limits.categories)
        .all(db)
        .await?;
    let categories = attach_trees(db, categories, tree_depth).await?;

    let all_subs = SubCategory::find()
        .filter(sub_category::Column::StoreId.eq(store_id))
        .order_by_asc(sub_category::Column::Id)
        .all(db)
        .await?;
    let mut sub_categories = Vec::new();
    for id in matching_sub_categories(&all_subs, query, tree_depth)
        .into_iter()
        .take(usize::try_from(limits.sub_categories).unwrap_or(usize::MAX))
    {
        // Nodes caught in a parent cycle have no tree or breadcrumb
        let Some(node) = build_tree(&subtree(&all_subs, id), tree_depth).into_iter().next() else {
            debug!("Skipping sub-category {id} without a tree");
            continue;
        };
        let Ok(display_name) = breadcrumb(&all_subs, id) else {
            debug!("Skipping sub-category {id} with a cyclic ancestry");
            continue;
        };
        sub_categories.push(SubCategoryMatch { node, display_name });
    }

    let mut products = Product::find()
        .filter(product::Column::StoreId.eq(store_id))
        .filter(product::Column::IsArchived.eq(false))
        .filter(name_contains(product::Column::Name, query));
    if let Some(brand_name) = params.brand_name.as_deref().filter(|b| !b.trim().is_empty()) {
        let brand = Brand::find()
            .filter(brand::Column::StoreId.eq(store_id))
            .filter(brand::Column::Name.eq(brand_name.trim()))
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("brand", brand_name))?;
        products = products.filter(product::Column::BrandId.eq(brand.id));
    }
    let products = products
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .offset((page - 1).saturating_mul(limit))
        .limit(limits.products)
        .all(db)
        .await?;

    Ok(SearchResults {
        brands,
        categories,
        sub_categories,
        products: load_product_views(db, products, None).await?,
        pagination: SearchPagination { page, limit },
    })
}
