use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "dispense_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fuel_operation::Entity")]
    FuelOperations,
}

impl Related<super::fuel_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelOperations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
