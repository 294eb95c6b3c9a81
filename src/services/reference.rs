//! Lookup reads for the static reference sets, plus the small admin write
//! surface for dispense types. Receipt statuses are fixed by migration and
//! have no write path: business rules depend on their ids.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{RequestContext, Role};
use crate::db::DbPool;
use crate::entities::dispense_type::{self, Entity as DispenseTypeEntity, Model as DispenseTypeModel};
use crate::entities::receipt_status::{self, Entity as ReceiptStatusEntity, Model as ReceiptStatusModel};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, tables, ActivityEntry, ActivityLogService};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DispenseTypeRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct ReferenceDataService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl ReferenceDataService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    pub async fn dispense_types(&self) -> Result<Vec<DispenseTypeModel>, ServiceError> {
        Ok(DispenseTypeEntity::find()
            .order_by_asc(dispense_type::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn receipt_statuses(&self) -> Result<Vec<ReceiptStatusModel>, ServiceError> {
        Ok(ReceiptStatusEntity::find()
            .order_by_asc(receipt_status::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id))]
    pub async fn create_dispense_type(
        &self,
        ctx: &RequestContext,
        request: DispenseTypeRequest,
    ) -> Result<DispenseTypeModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        let taken = DispenseTypeEntity::find()
            .filter(dispense_type::Column::Name.eq(request.name.as_str()))
            .count(&*self.db)
            .await?
            > 0;
        if taken {
            return Err(ServiceError::Conflict(format!(
                "dispense type {} already exists",
                request.name
            )));
        }

        let model = dispense_type::ActiveModel {
            name: Set(request.name),
            description: Set(request.description),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CREATE_DISPENSE_TYPE,
                table_name: Some(tables::DISPENSE_TYPES),
                record_id: Some(i64::from(created.id)),
                details: Some(format!("created dispense type {}", created.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id, dispense_type_id = id))]
    pub async fn update_dispense_type(
        &self,
        ctx: &RequestContext,
        id: i32,
        request: DispenseTypeRequest,
    ) -> Result<DispenseTypeModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        let existing = DispenseTypeEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("dispense type {id} not found")))?;

        let taken = DispenseTypeEntity::find()
            .filter(dispense_type::Column::Name.eq(request.name.as_str()))
            .filter(dispense_type::Column::Id.ne(id))
            .count(&*self.db)
            .await?
            > 0;
        if taken {
            return Err(ServiceError::Conflict(format!(
                "dispense type {} already exists",
                request.name
            )));
        }

        let mut model = existing.into_active_model();
        model.name = Set(request.name);
        model.description = Set(request.description);
        let updated = model.update(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::EDIT_DISPENSE_TYPE,
                table_name: Some(tables::DISPENSE_TYPES),
                record_id: Some(i64::from(id)),
                details: Some(format!("edited dispense type {}", updated.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(updated)
    }
}
