//! Location entity - A deliverable postal code (pincode) within a store.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Location database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the location
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning store
    pub store_id: i64,
    /// Postal code, unique per store
    pub pincode: String,
    /// City name
    pub city: String,
    /// State or province
    pub state: String,
    /// Country name
    pub country: String,
    /// Whether cash on delivery is offered here
    pub is_cod_available: bool,
    /// Promised delivery time in days (at least 1)
    pub delivery_days: i32,
    /// Price book used for this location, if any
    pub location_group_id: Option<i64>,
}

/// Defines relationships between Location and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each location may belong to one group
    #[sea_orm(
        belongs_to = "super::location_group::Entity",
        from = "Column::LocationGroupId",
        to = "super::location_group::Column::Id"
    )]
    LocationGroup,
}

impl Related<super::location_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
