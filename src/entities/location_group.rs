//! Location group entity - A price book shared by several delivery locations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Location group database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "location_groups")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the group
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning store
    pub store_id: i64,
    /// Display name (e.g., "Metro cities")
    pub name: String,
}

/// Defines relationships between LocationGroup and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One group covers many locations
    #[sea_orm(has_many = "super::location::Entity")]
    Locations,
    /// One group scopes many variant prices
    #[sea_orm(has_many = "super::variant_price::Entity")]
    VariantPrices,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Locations.def()
    }
}

impl Related<super::variant_price::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VariantPrices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
