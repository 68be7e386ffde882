//! URL slug generation.
//!
//! Slugs are derived from display names and must be unique per store within each
//! kind of record. Candidate selection is a pure function over the set of slugs
//! already taken; the database wrapper loads that set with a single prefix query.
//! The number of candidates is capped so a pathological catalog fails loudly with
//! [`Error::SlugExhausted`] instead of looping.

use crate::{
    entities::{Brand, Category, Product, SubCategory, brand, category, product, sub_category},
    errors::{Error, Result},
};
use sea_orm::{QuerySelect, Set, prelude::*};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Longest slug accepted anywhere in the catalog.
pub const MAX_SLUG_LEN: usize = 60;

/// Kinds of records that carry a per-store slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugKind {
    /// Products
    Product,
    /// Categories
    Category,
    /// Sub-categories
    SubCategory,
    /// Brands
    Brand,
}

/// Derives a URL-safe slug: ASCII alphanumerics lowercased, every other run of
/// characters collapsed into one `-`, no leading or trailing hyphen.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Checks a caller-supplied slug: non-empty, at most [`MAX_SLUG_LEN`] characters,
/// only lowercase letters, digits and hyphens.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(Error::validation("Slug is required"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(Error::validation(format!(
            "Slug must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(Error::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(())
}

fn candidate(base: &str, attempt: usize) -> String {
    let suffix = if attempt == 0 {
        String::new()
    } else {
        format!("-{attempt}")
    };
    let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let trimmed = if base.len() > room {
        base[..room].trim_end_matches('-')
    } else {
        base
    };
    format!("{trimmed}{suffix}")
}

/// Returns the first of `base`, `base-1`, `base-2`, ... that is not in `taken`.
///
/// # Errors
/// Returns [`Error::SlugExhausted`] after `max_attempts` candidates.
pub fn pick_unique_slug(base: &str, taken: &HashSet<String>, max_attempts: usize) -> Result<String> {
    (0..max_attempts)
        .map(|attempt| candidate(base, attempt))
        .find(|slug| !taken.contains(slug))
        .ok_or_else(|| Error::SlugExhausted {
            base: base.to_string(),
            attempts: max_attempts,
        })
}

/// The part of `base` that every candidate up to `max_attempts` starts with.
fn shared_prefix(base: &str, max_attempts: usize) -> &str {
    let longest_suffix = match max_attempts.checked_sub(1) {
        Some(last) if last > 0 => format!("-{last}").len(),
        _ => 0,
    };
    let room = MAX_SLUG_LEN.saturating_sub(longest_suffix);
    base[..base.len().min(room)].trim_end_matches('-')
}

fn truncated_base(name: &str) -> Result<String> {
    let base = slugify(name);
    if base.is_empty() {
        return Err(Error::validation(format!(
            "Name '{name}' does not contain any characters usable in a slug"
        )));
    }
    Ok(candidate(&base, 0))
}

/// Loads the store's slugs of `kind` that start with `prefix`, leaving out the
/// record `exclude_id` (the one being renamed).
pub async fn load_taken_slugs<C>(
    db: &C,
    kind: SlugKind,
    store_id: i64,
    prefix: &str,
    exclude_id: Option<i64>,
) -> Result<HashSet<String>>
where
    C: ConnectionTrait,
{
    macro_rules! taken_for {
        ($entity:ident, $module:ident) => {{
            let mut query = $entity::find()
                .select_only()
                .column($module::Column::Slug)
                .filter($module::Column::StoreId.eq(store_id))
                .filter($module::Column::Slug.starts_with(prefix));
            if let Some(id) = exclude_id {
                query = query.filter($module::Column::Id.ne(id));
            }
            query.into_tuple::<String>().all(db).await?
        }};
    }

    let slugs = match kind {
        SlugKind::Product => taken_for!(Product, product),
        SlugKind::Category => taken_for!(Category, category),
        SlugKind::SubCategory => taken_for!(SubCategory, sub_category),
        SlugKind::Brand => taken_for!(Brand, brand),
    };
    Ok(slugs.into_iter().collect())
}

/// Returns `true` if another record of `kind` in the store already uses `slug`.
pub async fn slug_in_use<C>(
    db: &C,
    kind: SlugKind,
    store_id: i64,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let taken = load_taken_slugs(db, kind, store_id, slug, exclude_id).await?;
    Ok(taken.contains(slug))
}

/// Generates a slug for `name` that no other record of `kind` in the store uses.
///
/// # Errors
/// - [`Error::Validation`] if `name` yields an empty slug
/// - [`Error::SlugExhausted`] if `max_attempts` candidates are all taken
pub async fn generate_unique_slug<C>(
    db: &C,
    kind: SlugKind,
    store_id: i64,
    name: &str,
    exclude_id: Option<i64>,
    max_attempts: usize,
) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = truncated_base(name)?;
    let prefix = shared_prefix(&base, max_attempts);
    let taken = load_taken_slugs(db, kind, store_id, prefix, exclude_id).await?;
    pick_unique_slug(&base, &taken, max_attempts)
}

/// Summary of a slug backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Products that received a slug
    pub products: usize,
    /// Categories that received a slug
    pub categories: usize,
    /// Sub-categories that received a slug
    pub sub_categories: usize,
    /// Brands that received a slug
    pub brands: usize,
}

/// Assigns slugs to every record whose slug is empty.
///
/// This is a maintenance operation for data imported without slugs. Records are
/// processed one at a time so each new slug is visible to the next lookup.
#[instrument(skip(db))]
pub async fn backfill_slugs(db: &DatabaseConnection, max_attempts: usize) -> Result<BackfillReport> {
    let mut report = BackfillReport::default();

    for row in Product::find()
        .filter(product::Column::Slug.eq(""))
        .all(db)
        .await?
    {
        let slug = generate_unique_slug(
            db,
            SlugKind::Product,
            row.store_id,
            &row.name,
            Some(row.id),
            max_attempts,
        )
        .await?;
        info!("Updated product: {} -> {}", row.name, slug);
        let mut active: product::ActiveModel = row.into();
        active.slug = Set(slug);
        active.update(db).await?;
        report.products += 1;
    }

    for row in Category::find()
        .filter(category::Column::Slug.eq(""))
        .all(db)
        .await?
    {
        let slug = generate_unique_slug(
            db,
            SlugKind::Category,
            row.store_id,
            &row.name,
            Some(row.id),
            max_attempts,
        )
        .await?;
        info!("Updated category: {} -> {}", row.name, slug);
        let mut active: category::ActiveModel = row.into();
        active.slug = Set(slug);
        active.update(db).await?;
        report.categories += 1;
    }

    for row in SubCategory::find()
        .filter(sub_category::Column::Slug.eq(""))
        .all(db)
        .await?
    {
        let slug = generate_unique_slug(
            db,
            SlugKind::SubCategory,
            row.store_id,
            &row.name,
            Some(row.id),
            max_attempts,
        )
        .await?;
        info!("Updated subcategory: {} -> {}", row.name, slug);
        let mut active: sub_category::ActiveModel = row.into();
        active.slug = Set(slug);
        active.update(db).await?;
        report.sub_categories += 1;
    }

    for row in Brand::find()
        .filter(brand::Column::Slug.eq(""))
        .all(db)
        .await?
    {
        let slug = generate_unique_slug(
            db,
            SlugKind::Brand,
            row.store_id,
            &row.name,
            Some(row.id),
            max_attempts,
        )
        .await?;
        info!("Updated brand: {} -> {}", row.name, slug);
        let mut active: brand::ActiveModel = row.into();
        active.slug = Set(slug);
        active.update(db).await?;
        report.brands += 1;
    }

    Ok(report)
}
