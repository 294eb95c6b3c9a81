//! Append-only activity log.
//!
//! Every mutating action in the system writes one row here. Rows are never
//! updated or deleted; this service exposes no API that could do either.
//! Audit facts ("who dispensed this and when", "who last edited this") are
//! reconstructed by querying the most recent row matching a
//! table/record/action triple rather than being stored on the record.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::activity_log::{self, Entity as ActivityLogEntity};
use crate::entities::user;
use crate::errors::ServiceError;

/// Canonical action labels. Audit reconstruction matches on these strings,
/// so they must never drift between the write and read sides.
pub mod actions {
    pub const CREATE_OPERATION: &str = "create operation";
    pub const EDIT_OPERATION: &str = "edit operation";
    pub const CHANGE_RECEIPT_STATUS: &str = "change receipt status";
    pub const DELETE_OPERATION: &str = "delete operation";

    pub const LOGIN: &str = "login";
    pub const FAILED_LOGIN: &str = "failed login";
    pub const LOGOUT: &str = "logout";

    pub const CREATE_USER: &str = "create user";
    pub const EDIT_USER: &str = "edit user";
    pub const DELETE_USER: &str = "delete user";
    pub const CHANGE_PASSWORD: &str = "change password";
    pub const ENABLE_USER: &str = "enable user";
    pub const DISABLE_USER: &str = "disable user";

    pub const CREATE_UNIT: &str = "create unit";
    pub const EDIT_UNIT: &str = "edit unit";
    pub const ENABLE_UNIT: &str = "enable unit";
    pub const DISABLE_UNIT: &str = "disable unit";

    pub const CREATE_DISPENSE_TYPE: &str = "create dispense type";
    pub const EDIT_DISPENSE_TYPE: &str = "edit dispense type";
}

/// Entity-type labels for the `table_name` column.
pub mod tables {
    pub const FUEL_OPERATIONS: &str = "fuel_operations";
    pub const USERS: &str = "users";
    pub const UNITS: &str = "units";
    pub const DISPENSE_TYPES: &str = "dispense_types";
}

/// One entry to append.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub user_id: Option<i64>,
    pub action: &'static str,
    pub table_name: Option<&'static str>,
    pub record_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
}

/// Log listing row with the actor's display name resolved.
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct ActivityLogRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Clone)]
pub struct ActivityLogService {
    db: Arc<DbPool>,
}

impl ActivityLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Appends one entry, best-effort.
    ///
    /// A storage failure here must not abort the business operation that
    /// triggered the entry, so the error is reported to the diagnostic
    /// channel and swallowed.
    pub async fn record(&self, entry: ActivityEntry) {
        let model = activity_log::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action.to_string()),
            table_name: Set(entry.table_name.map(str::to_string)),
            record_id: Set(entry.record_id),
            details: Set(entry.details),
            ip_address: Set(entry.ip_address),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(err) = model.insert(&*self.db).await {
            warn!(
                action = entry.action,
                record_id = ?entry.record_id,
                error = %err,
                "failed to append activity log entry"
            );
        }
    }

    /// Most recent entry matching the table/record/action triple.
    pub async fn latest(
        &self,
        table_name: &str,
        record_id: i64,
        action: &str,
    ) -> Result<Option<activity_log::Model>, ServiceError> {
        let entry = ActivityLogEntity::find()
            .filter(activity_log::Column::TableName.eq(table_name))
            .filter(activity_log::Column::RecordId.eq(record_id))
            .filter(activity_log::Column::Action.eq(action))
            .order_by_desc(activity_log::Column::CreatedAt)
            .order_by_desc(activity_log::Column::Id)
            .one(&*self.db)
            .await?;
        Ok(entry)
    }

    /// Like [`latest`](Self::latest), with the actor's display name resolved.
    pub async fn latest_with_actor(
        &self,
        table_name: &str,
        record_id: i64,
        action: &str,
    ) -> Result<Option<(activity_log::Model, Option<String>)>, ServiceError> {
        let Some(entry) = self.latest(table_name, record_id, action).await? else {
            return Ok(None);
        };

        let actor_name = match entry.user_id {
            Some(user_id) => user::Entity::find_by_id(user_id)
                .one(&*self.db)
                .await?
                .map(|account| account.name),
            None => None,
        };

        Ok(Some((entry, actor_name)))
    }

    /// Recent entries, newest first, optionally restricted to one entity type.
    pub async fn recent(
        &self,
        table_name: Option<&str>,
        limit: u64,
    ) -> Result<Vec<ActivityLogRow>, ServiceError> {
        let mut query = ActivityLogEntity::find()
            .select_only()
            .columns([
                activity_log::Column::Id,
                activity_log::Column::UserId,
                activity_log::Column::Action,
                activity_log::Column::TableName,
                activity_log::Column::RecordId,
                activity_log::Column::Details,
                activity_log::Column::IpAddress,
                activity_log::Column::CreatedAt,
            ])
            .column_as(user::Column::Name, "user_name")
            .join(JoinType::LeftJoin, activity_log::Relation::User.def())
            .order_by_desc(activity_log::Column::CreatedAt)
            .order_by_desc(activity_log::Column::Id)
            .limit(limit);

        if let Some(table_name) = table_name {
            query = query.filter(activity_log::Column::TableName.eq(table_name));
        }

        let rows = query.into_model::<ActivityLogRow>().all(&*self.db).await?;
        Ok(rows)
    }
}
