use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    /// Argon2 password hash; never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    /// One of the closed role labels, see [`crate::auth::Role`].
    pub role: String,
    pub unit_id: Option<i32>,
    pub is_active: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
    #[sea_orm(has_many = "super::fuel_operation::Entity")]
    FuelOperations,
    #[sea_orm(has_many = "super::activity_log::Entity")]
    ActivityLogs,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl Related<super::fuel_operation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelOperations.def()
    }
}

impl Related<super::activity_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
