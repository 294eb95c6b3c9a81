//! Unit administration. Units are reference data for operations, so they
//! are only ever soft-deleted via the active flag.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{RequestContext, Role};
use crate::db::DbPool;
use crate::entities::unit::{self, Entity as UnitEntity, Model as UnitModel};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, tables, ActivityEntry, ActivityLogService};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUnitRequest {
    #[validate(length(min = 1, message = "unit name is required"))]
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUnitRequest {
    #[validate(length(min = 1, message = "unit name is required"))]
    pub name: String,
    pub code: Option<String>,
}

#[derive(Clone)]
pub struct UnitService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl UnitService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    async fn name_taken(&self, name: &str, excluding: Option<i32>) -> Result<bool, ServiceError> {
        let mut query = UnitEntity::find().filter(unit::Column::Name.eq(name));
        if let Some(id) = excluding {
            query = query.filter(unit::Column::Id.ne(id));
        }
        Ok(query.count(&*self.db).await? > 0)
    }

    /// Units ordered by name; inactive ones only when requested.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<UnitModel>, ServiceError> {
        let mut query = UnitEntity::find().order_by_asc(unit::Column::Name);
        if !include_inactive {
            query = query.filter(unit::Column::IsActive.eq(true));
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateUnitRequest,
    ) -> Result<UnitModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        if self.name_taken(&request.name, None).await? {
            return Err(ServiceError::Conflict(format!(
                "unit {} already exists",
                request.name
            )));
        }

        let model = unit::ActiveModel {
            name: Set(request.name),
            code: Set(request.code),
            is_active: Set(true),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CREATE_UNIT,
                table_name: Some(tables::UNITS),
                record_id: Some(i64::from(created.id)),
                details: Some(format!("created unit {}", created.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(unit_id = created.id, "unit created");
        Ok(created)
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id, unit_id = id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i32,
        request: UpdateUnitRequest,
    ) -> Result<UnitModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        let existing = UnitEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {id} not found")))?;

        if self.name_taken(&request.name, Some(id)).await? {
            return Err(ServiceError::Conflict(format!(
                "unit {} already exists",
                request.name
            )));
        }

        let mut model = existing.into_active_model();
        model.name = Set(request.name);
        model.code = Set(request.code);
        let updated = model.update(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::EDIT_UNIT,
                table_name: Some(tables::UNITS),
                record_id: Some(i64::from(id)),
                details: Some(format!("edited unit {}", updated.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(updated)
    }

    /// Soft delete or reinstate. Operations referencing the unit are left
    /// untouched.
    #[instrument(skip(self, ctx), fields(admin_id = ctx.user_id, unit_id = id))]
    pub async fn set_active(
        &self,
        ctx: &RequestContext,
        id: i32,
        is_active: bool,
    ) -> Result<UnitModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        let existing = UnitEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("unit {id} not found")))?;

        let mut model = existing.into_active_model();
        model.is_active = Set(is_active);
        let updated = model.update(&*self.db).await?;

        let action = if is_active {
            actions::ENABLE_UNIT
        } else {
            actions::DISABLE_UNIT
        };
        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action,
                table_name: Some(tables::UNITS),
                record_id: Some(i64::from(id)),
                details: Some(format!("{} unit {}", action, updated.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(updated)
    }
}
