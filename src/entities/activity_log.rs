use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of a mutating action. Rows are never updated or
/// deleted; the audit trail is reconstructed by querying the latest row
/// matching a table/record/action triple.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// None records a failed or unauthenticated action.
    pub user_id: Option<i64>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
