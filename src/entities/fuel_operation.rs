use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One fuel dispensing request/receipt.
///
/// `month` is always the "YYYY-MM" prefix of `operation_date` and is kept
/// consistent on every edit. `receipt_number` is globally unique and
/// monotonically assigned; it is never reused after a delete.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fuel_operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub operation_date: Date,
    pub unit_id: Option<i32>,
    pub driver_name: String,
    pub vehicle_type: String,
    pub petrol_quantity: f64,
    pub diesel_quantity: f64,
    pub operation_officer: Option<String>,
    pub receipt_status_id: i32,
    pub receipt_number: i64,
    pub dispense_type_id: i32,
    pub purpose: Option<String>,
    pub month: String,
    pub notes: Option<String>,
    pub user_id: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unit::Entity",
        from = "Column::UnitId",
        to = "super::unit::Column::Id"
    )]
    Unit,
    #[sea_orm(
        belongs_to = "super::receipt_status::Entity",
        from = "Column::ReceiptStatusId",
        to = "super::receipt_status::Column::Id"
    )]
    ReceiptStatus,
    #[sea_orm(
        belongs_to = "super::dispense_type::Entity",
        from = "Column::DispenseTypeId",
        to = "super::dispense_type::Column::Id"
    )]
    DispenseType,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl Related<super::receipt_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptStatus.def()
    }
}

impl Related<super::dispense_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DispenseType.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
