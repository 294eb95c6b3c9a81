//! Read-side aggregates over fuel operations.
//!
//! Everything here is a pure query: per-day and per-month consumption
//! windows, per-unit totals, status distributions, and the dashboard
//! overview. Absent data always aggregates to zero, never to null.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::activity_log::{self, Entity as ActivityLogEntity};
use crate::entities::fuel_operation::{self, Entity as FuelOperationEntity};
use crate::entities::receipt_status::{self, Entity as ReceiptStatusEntity, DISPENSED_STATUS_ID};
use crate::entities::unit::{self, Entity as UnitEntity};
use crate::entities::user::{self, Entity as UserEntity};
use crate::entities::dispense_type::{self, Entity as DispenseTypeEntity};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, tables, ActivityLogRow, ActivityLogService};
use crate::services::operations::{joined_select, OperationRow};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyConsumption {
    pub operation_date: NaiveDate,
    pub total_petrol: f64,
    pub total_diesel: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlyConsumption {
    pub month: String,
    pub operation_count: i64,
    pub total_petrol: f64,
    pub total_diesel: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnitConsumption {
    pub unit_id: i32,
    pub unit_name: String,
    pub operation_count: i64,
    pub total_petrol: f64,
    pub total_diesel: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status_id: i32,
    pub status_name: String,
    pub color_code: Option<String>,
    pub operation_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DispenseTypeStats {
    pub dispense_type_id: i32,
    pub type_name: String,
    pub operation_count: i64,
    pub total_petrol: f64,
    pub total_diesel: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct ActiveUser {
    pub id: i64,
    pub name: String,
}

/// Today's duty-officer dashboard numbers.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodayStats {
    pub date: NaiveDate,
    pub total_operations: u64,
    pub dispensed_receipts: u64,
    pub pending_receipts: u64,
    pub dispensed_percentage: f64,
    pub pending_percentage: f64,
    pub total_petrol: f64,
    pub total_diesel: f64,
    pub active_users: usize,
}

/// Administrator overview.
#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewReport {
    pub total_users: u64,
    pub active_units: u64,
    pub total_operations: u64,
    pub total_petrol: f64,
    pub total_diesel: f64,
    pub recent_operations: Vec<OperationRow>,
    pub recent_activity: Vec<ActivityLogRow>,
}

#[derive(Debug, FromQueryResult)]
struct FuelSums {
    total_petrol: Option<f64>,
    total_diesel: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct DailyRow {
    operation_date: NaiveDate,
    total_petrol: Option<f64>,
    total_diesel: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct MonthlyRow {
    month: String,
    operation_count: i64,
    total_petrol: Option<f64>,
    total_diesel: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct UnitRow {
    unit_id: i32,
    unit_name: String,
    operation_count: i64,
    total_petrol: Option<f64>,
    total_diesel: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct DispenseTypeRow {
    dispense_type_id: i32,
    type_name: String,
    operation_count: i64,
    total_petrol: Option<f64>,
    total_diesel: Option<f64>,
}

#[derive(Clone)]
pub struct ReportsService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl ReportsService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    async fn fuel_sums(
        &self,
        filter: Option<sea_orm::sea_query::SimpleExpr>,
    ) -> Result<(f64, f64), ServiceError> {
        let mut query = FuelOperationEntity::find()
            .select_only()
            .column_as(fuel_operation::Column::PetrolQuantity.sum(), "total_petrol")
            .column_as(fuel_operation::Column::DieselQuantity.sum(), "total_diesel");
        if let Some(filter) = filter {
            query = query.filter(filter);
        }
        let sums = query.into_model::<FuelSums>().one(&*self.db).await?;
        let sums = sums.unwrap_or(FuelSums {
            total_petrol: None,
            total_diesel: None,
        });
        Ok((
            sums.total_petrol.unwrap_or(0.0),
            sums.total_diesel.unwrap_or(0.0),
        ))
    }

    /// Per-day totals over a trailing window ending today.
    #[instrument(skip(self))]
    pub async fn daily_consumption(&self, days: u32) -> Result<Vec<DailyConsumption>, ServiceError> {
        let cutoff = Utc::now().date_naive() - Duration::days(i64::from(days.saturating_sub(1)));

        let rows = FuelOperationEntity::find()
            .select_only()
            .column(fuel_operation::Column::OperationDate)
            .column_as(fuel_operation::Column::PetrolQuantity.sum(), "total_petrol")
            .column_as(fuel_operation::Column::DieselQuantity.sum(), "total_diesel")
            .filter(fuel_operation::Column::OperationDate.gte(cutoff))
            .group_by(fuel_operation::Column::OperationDate)
            .order_by_asc(fuel_operation::Column::OperationDate)
            .into_model::<DailyRow>()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailyConsumption {
                operation_date: row.operation_date,
                total_petrol: row.total_petrol.unwrap_or(0.0),
                total_diesel: row.total_diesel.unwrap_or(0.0),
            })
            .collect())
    }

    /// Per-month totals over a trailing window, newest month first.
    #[instrument(skip(self))]
    pub async fn monthly_consumption(
        &self,
        months: u32,
    ) -> Result<Vec<MonthlyConsumption>, ServiceError> {
        let rows = FuelOperationEntity::find()
            .select_only()
            .column(fuel_operation::Column::Month)
            .column_as(fuel_operation::Column::Id.count(), "operation_count")
            .column_as(fuel_operation::Column::PetrolQuantity.sum(), "total_petrol")
            .column_as(fuel_operation::Column::DieselQuantity.sum(), "total_diesel")
            .group_by(fuel_operation::Column::Month)
            .order_by_desc(fuel_operation::Column::Month)
            .limit(u64::from(months))
            .into_model::<MonthlyRow>()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| MonthlyConsumption {
                month: row.month,
                operation_count: row.operation_count,
                total_petrol: row.total_petrol.unwrap_or(0.0),
                total_diesel: row.total_diesel.unwrap_or(0.0),
            })
            .collect())
    }

    /// Per-unit totals over active units, sorted descending by combined
    /// volume. Units with no operations report zeros.
    #[instrument(skip(self))]
    pub async fn unit_consumption(&self) -> Result<Vec<UnitConsumption>, ServiceError> {
        let rows = UnitEntity::find()
            .select_only()
            .column_as(unit::Column::Id, "unit_id")
            .column_as(unit::Column::Name, "unit_name")
            .column_as(fuel_operation::Column::Id.count(), "operation_count")
            .column_as(fuel_operation::Column::PetrolQuantity.sum(), "total_petrol")
            .column_as(fuel_operation::Column::DieselQuantity.sum(), "total_diesel")
            .join(JoinType::LeftJoin, unit::Relation::FuelOperations.def())
            .filter(unit::Column::IsActive.eq(true))
            .group_by(unit::Column::Id)
            .group_by(unit::Column::Name)
            .into_model::<UnitRow>()
            .all(&*self.db)
            .await?;

        let mut totals: Vec<UnitConsumption> = rows
            .into_iter()
            .map(|row| UnitConsumption {
                unit_id: row.unit_id,
                unit_name: row.unit_name,
                operation_count: row.operation_count,
                total_petrol: row.total_petrol.unwrap_or(0.0),
                total_diesel: row.total_diesel.unwrap_or(0.0),
            })
            .collect();

        totals.sort_by(|a, b| {
            let combined_a = a.total_petrol + a.total_diesel;
            let combined_b = b.total_petrol + b.total_diesel;
            combined_b
                .partial_cmp(&combined_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(totals)
    }

    /// Operation count per receipt status. Left-joined from the status
    /// table so statuses with zero matching operations still appear.
    #[instrument(skip(self))]
    pub async fn status_distribution(&self) -> Result<Vec<StatusCount>, ServiceError> {
        #[derive(FromQueryResult)]
        struct StatusRow {
            status_id: i32,
            status_name: String,
            color_code: Option<String>,
            operation_count: i64,
        }

        let rows = ReceiptStatusEntity::find()
            .select_only()
            .column_as(receipt_status::Column::Id, "status_id")
            .column_as(receipt_status::Column::Name, "status_name")
            .column(receipt_status::Column::ColorCode)
            .column_as(fuel_operation::Column::Id.count(), "operation_count")
            .join(JoinType::LeftJoin, receipt_status::Relation::FuelOperations.def())
            .group_by(receipt_status::Column::Id)
            .group_by(receipt_status::Column::Name)
            .group_by(receipt_status::Column::ColorCode)
            .order_by_asc(receipt_status::Column::Id)
            .into_model::<StatusRow>()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusCount {
                status_id: row.status_id,
                status_name: row.status_name,
                color_code: row.color_code,
                operation_count: row.operation_count,
            })
            .collect())
    }

    /// Operation count and fuel totals per dispense type, busiest first.
    #[instrument(skip(self))]
    pub async fn dispense_type_stats(&self) -> Result<Vec<DispenseTypeStats>, ServiceError> {
        let rows = DispenseTypeEntity::find()
            .select_only()
            .column_as(dispense_type::Column::Id, "dispense_type_id")
            .column_as(dispense_type::Column::Name, "type_name")
            .column_as(fuel_operation::Column::Id.count(), "operation_count")
            .column_as(fuel_operation::Column::PetrolQuantity.sum(), "total_petrol")
            .column_as(fuel_operation::Column::DieselQuantity.sum(), "total_diesel")
            .join(JoinType::LeftJoin, dispense_type::Relation::FuelOperations.def())
            .group_by(dispense_type::Column::Id)
            .group_by(dispense_type::Column::Name)
            .into_model::<DispenseTypeRow>()
            .all(&*self.db)
            .await?;

        let mut stats: Vec<DispenseTypeStats> = rows
            .into_iter()
            .map(|row| DispenseTypeStats {
                dispense_type_id: row.dispense_type_id,
                type_name: row.type_name,
                operation_count: row.operation_count,
                total_petrol: row.total_petrol.unwrap_or(0.0),
                total_diesel: row.total_diesel.unwrap_or(0.0),
            })
            .collect();

        stats.sort_by(|a, b| b.operation_count.cmp(&a.operation_count));

        Ok(stats)
    }

    /// Distinct users with a login entry recorded today.
    #[instrument(skip(self))]
    pub async fn active_users_today(&self) -> Result<Vec<ActiveUser>, ServiceError> {
        let today_start = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        let users = ActivityLogEntity::find()
            .select_only()
            .column_as(user::Column::Id, "id")
            .column_as(user::Column::Name, "name")
            .join(JoinType::InnerJoin, activity_log::Relation::User.def())
            .filter(activity_log::Column::Action.eq(actions::LOGIN))
            .filter(activity_log::Column::CreatedAt.gte(today_start))
            .distinct()
            .into_model::<ActiveUser>()
            .all(&*self.db)
            .await?;

        Ok(users)
    }

    /// Today's dashboard numbers: operation counts, dispensed/pending split
    /// with percentages, fuel totals, and active users.
    #[instrument(skip(self))]
    pub async fn today_stats(&self) -> Result<TodayStats, ServiceError> {
        let today = Utc::now().date_naive();

        let total_operations = FuelOperationEntity::find()
            .filter(fuel_operation::Column::OperationDate.eq(today))
            .count(&*self.db)
            .await?;
        let dispensed_receipts = FuelOperationEntity::find()
            .filter(fuel_operation::Column::OperationDate.eq(today))
            .filter(fuel_operation::Column::ReceiptStatusId.eq(DISPENSED_STATUS_ID))
            .count(&*self.db)
            .await?;
        let pending_receipts = total_operations - dispensed_receipts;

        let (total_petrol, total_diesel) = self
            .fuel_sums(Some(fuel_operation::Column::OperationDate.eq(today)))
            .await?;

        let (dispensed_percentage, pending_percentage) = if total_operations > 0 {
            (
                dispensed_receipts as f64 / total_operations as f64 * 100.0,
                pending_receipts as f64 / total_operations as f64 * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        let active_users = self.active_users_today().await?.len();

        Ok(TodayStats {
            date: today,
            total_operations,
            dispensed_receipts,
            pending_receipts,
            dispensed_percentage,
            pending_percentage,
            total_petrol,
            total_diesel,
            active_users,
        })
    }

    /// Administrator overview: global counters plus the ten most recent
    /// operations and activity entries.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<OverviewReport, ServiceError> {
        let total_users = UserEntity::find().count(&*self.db).await?;
        let active_units = UnitEntity::find()
            .filter(unit::Column::IsActive.eq(true))
            .count(&*self.db)
            .await?;
        let total_operations = FuelOperationEntity::find().count(&*self.db).await?;
        let (total_petrol, total_diesel) = self.fuel_sums(None).await?;

        let recent_operations = joined_select()
            .order_by_desc(fuel_operation::Column::CreatedAt)
            .limit(10)
            .into_model::<OperationRow>()
            .all(&*self.db)
            .await?;

        let recent_activity = self.activity.recent(Some(tables::FUEL_OPERATIONS), 10).await?;

        Ok(OverviewReport {
            total_users,
            active_units,
            total_operations,
            total_petrol,
            total_diesel,
            recent_operations,
            recent_activity,
        })
    }
}
