//! Fuel operation lifecycle: create, edit, dispense, delete, and the read
//! side that feeds lists and detail views.
//!
//! All writes go through an explicit [`RequestContext`] so role and
//! ownership rules are enforced in one place, and every successful mutation
//! appends an activity-log entry.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Alias, Expr, ExprTrait, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, IntoActiveModel,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{RequestContext, Role};
use crate::db::DbPool;
use crate::entities::dispense_type::Entity as DispenseTypeEntity;
use crate::entities::fuel_operation::{
    self, Entity as FuelOperationEntity, Model as FuelOperationModel,
};
use crate::entities::receipt_status::{
    Entity as ReceiptStatusEntity, DISPENSED_STATUS_ID, PENDING_STATUS_ID,
};
use crate::entities::unit::{self, Entity as UnitEntity};
use crate::entities::{dispense_type, receipt_status, user};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, tables, ActivityEntry, ActivityLogService};

/// Receipt numbering starts above this seed: the first receipt is 1001.
pub const RECEIPT_NUMBER_SEED: i64 = 1000;

/// Bounded retries for the max+1 receipt assignment when two creates race
/// into the unique index.
const RECEIPT_ASSIGN_ATTEMPTS: u32 = 3;

fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Request/response types for the operation service

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOperationRequest {
    pub operation_date: NaiveDate,
    pub unit_id: Option<i32>,
    #[validate(length(min = 1, message = "driver name is required"))]
    pub driver_name: String,
    #[validate(length(min = 1, message = "vehicle type is required"))]
    pub vehicle_type: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "petrol quantity must not be negative"))]
    pub petrol_quantity: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "diesel quantity must not be negative"))]
    pub diesel_quantity: f64,
    /// Explicit status; defaults to pending when absent.
    pub receipt_status_id: Option<i32>,
    pub dispense_type_id: i32,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub operation_officer: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOperationRequest {
    pub operation_date: NaiveDate,
    pub unit_id: Option<i32>,
    #[validate(length(min = 1, message = "driver name is required"))]
    pub driver_name: String,
    #[validate(length(min = 1, message = "vehicle type is required"))]
    pub vehicle_type: String,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "petrol quantity must not be negative"))]
    pub petrol_quantity: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "diesel quantity must not be negative"))]
    pub diesel_quantity: f64,
    pub dispense_type_id: i32,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DispenseRequest {
    #[validate(length(min = 1, message = "operation officer is required"))]
    pub operation_officer: String,
    pub dispense_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OperationResponse {
    pub id: i64,
    pub operation_date: NaiveDate,
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
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// List/detail row with display names joined in.
#[derive(Debug, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct OperationRow {
    pub id: i64,
    pub operation_date: NaiveDate,
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
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub unit_name: Option<String>,
    pub status_name: String,
    pub status_color: Option<String>,
    pub dispense_type_name: String,
    pub created_by: String,
}

/// Detail view: the joined row plus audit facts reconstructed from the
/// activity log.
#[derive(Debug, Serialize, ToSchema)]
pub struct OperationDetail {
    #[serde(flatten)]
    pub operation: OperationRow,
    pub last_updated_by: Option<String>,
    pub dispensed_by: Option<String>,
    pub dispensed_at: Option<chrono::DateTime<Utc>>,
    pub dispense_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OperationListResponse {
    pub operations: Vec<OperationRow>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OperationFilter {
    /// Case-insensitive substring over driver name, vehicle type, receipt
    /// number, and purpose.
    pub search: Option<String>,
    pub unit_id: Option<i32>,
    pub status_id: Option<i32>,
    /// "YYYY-MM"
    pub month: Option<String>,
    /// Restrict to operations created by this user.
    pub created_by: Option<i64>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for OperationFilter {
    fn default() -> Self {
        Self {
            search: None,
            unit_id: None,
            status_id: None,
            month: None,
            created_by: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// Base select joining the display names used by lists and dashboards.
pub(crate) fn joined_select() -> Select<FuelOperationEntity> {
    FuelOperationEntity::find()
        .select_only()
        .columns([
            fuel_operation::Column::Id,
            fuel_operation::Column::OperationDate,
            fuel_operation::Column::UnitId,
            fuel_operation::Column::DriverName,
            fuel_operation::Column::VehicleType,
            fuel_operation::Column::PetrolQuantity,
            fuel_operation::Column::DieselQuantity,
            fuel_operation::Column::OperationOfficer,
            fuel_operation::Column::ReceiptStatusId,
            fuel_operation::Column::ReceiptNumber,
            fuel_operation::Column::DispenseTypeId,
            fuel_operation::Column::Purpose,
            fuel_operation::Column::Month,
            fuel_operation::Column::Notes,
            fuel_operation::Column::UserId,
            fuel_operation::Column::CreatedAt,
            fuel_operation::Column::UpdatedAt,
        ])
        .column_as(unit::Column::Name, "unit_name")
        .column_as(receipt_status::Column::Name, "status_name")
        .column_as(receipt_status::Column::ColorCode, "status_color")
        .column_as(dispense_type::Column::Name, "dispense_type_name")
        .column_as(user::Column::Name, "created_by")
        .join(JoinType::LeftJoin, fuel_operation::Relation::Unit.def())
        .join(
            JoinType::InnerJoin,
            fuel_operation::Relation::ReceiptStatus.def(),
        )
        .join(
            JoinType::InnerJoin,
            fuel_operation::Relation::DispenseType.def(),
        )
        .join(JoinType::InnerJoin, fuel_operation::Relation::User.def())
}

fn ci_like(column: fuel_operation::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((fuel_operation::Entity, column)))).like(needle)
}

/// Service mediating all fuel operation reads and writes.
#[derive(Clone)]
pub struct FuelOperationService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl FuelOperationService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    async fn check_unit_reference(&self, unit_id: i32) -> Result<(), ServiceError> {
        let unit = UnitEntity::find_by_id(unit_id).one(&*self.db).await?;
        match unit {
            Some(unit) if unit.is_active => Ok(()),
            Some(_) => Err(ServiceError::ValidationError(format!(
                "unit {unit_id} is inactive"
            ))),
            None => Err(ServiceError::ValidationError(format!(
                "unknown unit {unit_id}"
            ))),
        }
    }

    async fn check_dispense_type(&self, dispense_type_id: i32) -> Result<(), ServiceError> {
        DispenseTypeEntity::find_by_id(dispense_type_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown dispense type {dispense_type_id}"))
            })
    }

    async fn check_receipt_status(&self, status_id: i32) -> Result<(), ServiceError> {
        ReceiptStatusEntity::find_by_id(status_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("unknown receipt status {status_id}"))
            })
    }

    /// Creates an operation and assigns the next receipt number.
    ///
    /// The max+1 read and the insert run inside one transaction; when a
    /// concurrent create wins the race to the unique index, the whole
    /// sequence is retried with a fresh read.
    #[instrument(skip(self, ctx, request), fields(user_id = ctx.user_id))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateOperationRequest,
    ) -> Result<OperationResponse, ServiceError> {
        ctx.require(Role::OperationsDuty)?;
        request.validate()?;

        let unit_id = request.unit_id.ok_or_else(|| {
            ServiceError::ValidationError("a unit reference is required".to_string())
        })?;
        self.check_unit_reference(unit_id).await?;
        self.check_dispense_type(request.dispense_type_id).await?;

        let status_id = request.receipt_status_id.unwrap_or(PENDING_STATUS_ID);
        self.check_receipt_status(status_id).await?;

        let month = month_of(request.operation_date);

        let mut inserted: Option<FuelOperationModel> = None;
        for attempt in 1..=RECEIPT_ASSIGN_ATTEMPTS {
            let txn = self.db.begin().await?;

            let current_max: Option<Option<i64>> = FuelOperationEntity::find()
                .select_only()
                .column_as(fuel_operation::Column::ReceiptNumber.max(), "max_receipt")
                .into_tuple()
                .one(&txn)
                .await?;
            let receipt_number = current_max.flatten().unwrap_or(RECEIPT_NUMBER_SEED) + 1;

            let now = Utc::now();
            let model = fuel_operation::ActiveModel {
                operation_date: Set(request.operation_date),
                unit_id: Set(Some(unit_id)),
                driver_name: Set(request.driver_name.clone()),
                vehicle_type: Set(request.vehicle_type.clone()),
                petrol_quantity: Set(request.petrol_quantity),
                diesel_quantity: Set(request.diesel_quantity),
                operation_officer: Set(request.operation_officer.clone()),
                receipt_status_id: Set(status_id),
                receipt_number: Set(receipt_number),
                dispense_type_id: Set(request.dispense_type_id),
                purpose: Set(request.purpose.clone()),
                month: Set(month.clone()),
                notes: Set(request.notes.clone()),
                user_id: Set(ctx.user_id),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match model.insert(&txn).await {
                Ok(record) => {
                    txn.commit().await?;
                    inserted = Some(record);
                    break;
                }
                Err(err)
                    if ServiceError::is_unique_violation(&err)
                        && attempt < RECEIPT_ASSIGN_ATTEMPTS =>
                {
                    let _ = txn.rollback().await;
                    warn!(attempt, receipt_number, "receipt number collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let record = inserted.ok_or_else(|| {
            ServiceError::Conflict("could not assign a unique receipt number".to_string())
        })?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CREATE_OPERATION,
                table_name: Some(tables::FUEL_OPERATIONS),
                record_id: Some(record.id),
                details: Some(format!("created receipt #{}", record.receipt_number)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(
            operation_id = record.id,
            receipt_number = record.receipt_number,
            "operation created"
        );

        Ok(model_to_response(record))
    }

    /// Overwrites the editable fields of a pending operation.
    ///
    /// Only the creating user may edit, and a dispensed record rejects every
    /// edit regardless of caller.
    #[instrument(skip(self, ctx, request), fields(user_id = ctx.user_id, operation_id = id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        request: UpdateOperationRequest,
    ) -> Result<OperationResponse, ServiceError> {
        ctx.require(Role::OperationsDuty)?;
        request.validate()?;

        let record = FuelOperationEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("operation {id} not found")))?;

        if record.user_id != ctx.user_id {
            return Err(ServiceError::Forbidden(
                "only the creating user may edit an operation".to_string(),
            ));
        }

        if record.receipt_status_id == DISPENSED_STATUS_ID {
            return Err(ServiceError::Conflict(
                "a dispensed operation can no longer be edited".to_string(),
            ));
        }

        if let Some(unit_id) = request.unit_id {
            self.check_unit_reference(unit_id).await?;
        }
        self.check_dispense_type(request.dispense_type_id).await?;

        let receipt_number = record.receipt_number;
        let month = month_of(request.operation_date);

        let mut model = record.into_active_model();
        model.operation_date = Set(request.operation_date);
        model.unit_id = Set(request.unit_id);
        model.driver_name = Set(request.driver_name);
        model.vehicle_type = Set(request.vehicle_type);
        model.petrol_quantity = Set(request.petrol_quantity);
        model.diesel_quantity = Set(request.diesel_quantity);
        model.dispense_type_id = Set(request.dispense_type_id);
        model.purpose = Set(request.purpose);
        model.notes = Set(request.notes);
        model.month = Set(month);
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::EDIT_OPERATION,
                table_name: Some(tables::FUEL_OPERATIONS),
                record_id: Some(updated.id),
                details: Some(format!("edited receipt #{receipt_number}")),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(operation_id = updated.id, "operation updated");

        Ok(model_to_response(updated))
    }

    /// Marks a pending operation as dispensed.
    ///
    /// Any fuel-duty actor may dispense any pending record; ownership does
    /// not apply here.
    #[instrument(skip(self, ctx, request), fields(user_id = ctx.user_id, operation_id = id))]
    pub async fn dispense(
        &self,
        ctx: &RequestContext,
        id: i64,
        request: DispenseRequest,
    ) -> Result<OperationResponse, ServiceError> {
        ctx.require(Role::FuelDuty)?;
        request.validate()?;

        let record = FuelOperationEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("operation {id} not found")))?;

        if record.receipt_status_id == DISPENSED_STATUS_ID {
            return Err(ServiceError::Conflict(
                "this receipt has already been dispensed".to_string(),
            ));
        }

        let receipt_number = record.receipt_number;

        let mut model = record.into_active_model();
        model.receipt_status_id = Set(DISPENSED_STATUS_ID);
        model.operation_officer = Set(Some(request.operation_officer));
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        let notes = request
            .dispense_notes
            .filter(|notes| !notes.trim().is_empty())
            .unwrap_or_else(|| "none".to_string());
        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CHANGE_RECEIPT_STATUS,
                table_name: Some(tables::FUEL_OPERATIONS),
                record_id: Some(updated.id),
                details: Some(format!("receipt #{receipt_number} dispensed. notes: {notes}")),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(
            operation_id = updated.id,
            receipt_number, "receipt dispensed"
        );

        Ok(model_to_response(updated))
    }

    /// Hard-deletes an operation. Dispensed records stay deletable; the
    /// receipt number is captured before the row disappears and is never
    /// reassigned.
    #[instrument(skip(self, ctx), fields(user_id = ctx.user_id, operation_id = id))]
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ServiceError> {
        let record = FuelOperationEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("operation {id} not found")))?;

        let receipt_number = record.receipt_number;

        FuelOperationEntity::delete_by_id(id).exec(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::DELETE_OPERATION,
                table_name: Some(tables::FUEL_OPERATIONS),
                record_id: Some(id),
                details: Some(format!("deleted receipt #{receipt_number}")),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(operation_id = id, receipt_number, "operation deleted");

        Ok(())
    }

    /// Detail view with audit facts derived from the activity log. The
    /// derived fields stay empty until a matching log row exists.
    #[instrument(skip(self), fields(operation_id = id))]
    pub async fn get(&self, id: i64) -> Result<OperationDetail, ServiceError> {
        let operation = joined_select()
            .filter(fuel_operation::Column::Id.eq(id))
            .into_model::<OperationRow>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("operation {id} not found")))?;

        let dispense_entry = self
            .activity
            .latest_with_actor(tables::FUEL_OPERATIONS, id, actions::CHANGE_RECEIPT_STATUS)
            .await?;
        let edit_entry = self
            .activity
            .latest_with_actor(tables::FUEL_OPERATIONS, id, actions::EDIT_OPERATION)
            .await?;

        let (dispensed_at, dispensed_by, dispense_notes) = match dispense_entry {
            Some((entry, actor)) => (Some(entry.created_at), actor, entry.details),
            None => (None, None, None),
        };

        Ok(OperationDetail {
            operation,
            last_updated_by: edit_entry.and_then(|(_, actor)| actor),
            dispensed_by,
            dispensed_at,
            dispense_notes,
        })
    }

    /// Filtered, paginated listing ordered by operation date (newest first),
    /// ties broken by creation time.
    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: OperationFilter) -> Result<OperationListResponse, ServiceError> {
        let mut query = joined_select();

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(ci_like(fuel_operation::Column::DriverName, &needle))
                    .add(ci_like(fuel_operation::Column::VehicleType, &needle))
                    .add(ci_like(fuel_operation::Column::Purpose, &needle))
                    .add(
                        Expr::col((
                            fuel_operation::Entity,
                            fuel_operation::Column::ReceiptNumber,
                        ))
                        .cast_as(Alias::new("text"))
                        .like(needle.clone()),
                    ),
            );
        }

        if let Some(unit_id) = filter.unit_id {
            query = query.filter(fuel_operation::Column::UnitId.eq(unit_id));
        }
        if let Some(status_id) = filter.status_id {
            query = query.filter(fuel_operation::Column::ReceiptStatusId.eq(status_id));
        }
        if let Some(month) = filter.month.as_deref().filter(|m| !m.is_empty()) {
            query = query.filter(fuel_operation::Column::Month.eq(month));
        }
        if let Some(created_by) = filter.created_by {
            query = query.filter(fuel_operation::Column::UserId.eq(created_by));
        }

        let query = query
            .order_by_desc(fuel_operation::Column::OperationDate)
            .order_by_desc(fuel_operation::Column::CreatedAt);

        let per_page = filter.limit.clamp(1, 500);
        let page = filter.page.max(1);

        let paginator = query.into_model::<OperationRow>().paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let operations = paginator.fetch_page(page - 1).await?;

        Ok(OperationListResponse {
            operations,
            total,
            page,
            per_page,
        })
    }

    /// Distinct months with at least one operation, newest first.
    pub async fn months(&self) -> Result<Vec<String>, ServiceError> {
        let months: Vec<String> = FuelOperationEntity::find()
            .select_only()
            .column(fuel_operation::Column::Month)
            .distinct()
            .order_by_desc(fuel_operation::Column::Month)
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(months)
    }
}

fn model_to_response(model: FuelOperationModel) -> OperationResponse {
    OperationResponse {
        id: model.id,
        operation_date: model.operation_date,
        unit_id: model.unit_id,
        driver_name: model.driver_name,
        vehicle_type: model.vehicle_type,
        petrol_quantity: model.petrol_quantity,
        diesel_quantity: model.diesel_quantity,
        operation_officer: model.operation_officer,
        receipt_status_id: model.receipt_status_id,
        receipt_number: model.receipt_number,
        dispense_type_id: model.dispense_type_id,
        purpose: model.purpose,
        month: model.month,
        notes: model.notes,
        user_id: model.user_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
