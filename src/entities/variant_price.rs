//! Variant price entity - Price and MRP of a variant within one location group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Variant price database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "variant_prices")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the price record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Variant being priced
    pub variant_id: i64,
    /// Location group this price applies to
    pub location_group_id: i64,
    /// Selling price
    pub price: f64,
    /// Maximum retail price shown as the strike-through amount
    pub mrp: f64,
}

/// Defines relationships between VariantPrice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each price belongs to one variant
    #[sea_orm(
        belongs_to = "super::variant::Entity",
        from = "Column::VariantId",
        to = "super::variant::Column::Id",
        on_delete = "Cascade"
    )]
    Variant,
    /// Each price is scoped to one location group
    #[sea_orm(
        belongs_to = "super::location_group::Entity",
        from = "Column::LocationGroupId",
        to = "super::location_group::Column::Id"
    )]
    LocationGroup,
}

impl Related<super::variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl Related<super::location_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
