//! Sub-category entity - A node in a category's taxonomy tree.
//!
//! `parent_id` is a nullable self-reference. The chain of parents must never
//! loop; writes go through `core::sub_category`, which walks the ancestors first.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sub-category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sub_categories")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the sub-category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning store
    pub store_id: i64,
    /// Category this node belongs to
    pub category_id: i64,
    /// Parent sub-category, `None` for top-level nodes
    pub parent_id: Option<i64>,
    /// Display name (e.g., "Laptops")
    pub name: String,
    /// URL-safe identifier, unique per store
    pub slug: String,
    /// Optional banner shown on the storefront listing page
    pub banner_image: Option<String>,
    /// When the sub-category was created
    pub created_at: DateTime,
    /// When the sub-category was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between SubCategory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sub-category belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Optional parent sub-category
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
