use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An organizational subdivision that consumes fuel. Units are soft-deleted
/// via `is_active` and never hard-deleted: operations keep referencing them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub code: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fuel_operation::Entity")]
    FuelOperations,
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::fuel_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelOperations.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
