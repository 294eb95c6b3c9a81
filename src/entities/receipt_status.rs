use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Receipt status lookup row. Status identity, not label, drives business
/// rules: id 1 is the terminal "dispensed" status.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "receipt_statuses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub color_code: Option<String>,
}

/// The terminal "dispensed" status. Records with this status accept no
/// further field edits.
pub const DISPENSED_STATUS_ID: i32 = 1;

/// Default status for newly created operations.
pub const PENDING_STATUS_ID: i32 = 2;

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
