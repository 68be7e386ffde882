//! Variant entity - A purchasable size/color combination of a product.
//!
//! Stock is tracked per variant. SKU and HSN codes are optional but unique
//! across the whole database when present.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Variant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variants")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the variant
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this variant belongs to
    pub product_id: i64,
    /// Optional opaque size reference
    pub size_id: Option<i64>,
    /// Optional opaque color reference
    pub color_id: Option<i64>,
    /// Units on hand, never negative
    pub stock: i32,
    /// Stock keeping unit code
    #[sea_orm(unique)]
    pub sku: Option<String>,
    /// Harmonized system (tax) code
    #[sea_orm(unique)]
    pub hsn: Option<String>,
}

/// Defines relationships between Variant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each variant belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    /// One variant has many location-group prices
    #[sea_orm(has_many = "super::variant_price::Entity")]
    VariantPrices,
    /// One variant has many media records
    #[sea_orm(has_many = "super::variant_media::Entity")]
    Media,
    /// One variant appears in many order items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::variant_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantPrices.def()
    }
}

impl Related<super::variant_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
