//! User account administration. Every operation here is gated on the
//! system-administrator role and logged.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, IntoActiveModel, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, RequestContext, Role};
use crate::db::DbPool;
use crate::entities::unit::{self, Entity as UnitEntity};
use crate::entities::user::{self, Entity as UserEntity, Model as UserModel};
use crate::errors::ServiceError;
use crate::services::activity_log::{actions, tables, ActivityEntry, ActivityLogService};

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub role: Role,
    pub unit_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub role: Role,
    pub unit_id: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, FromQueryResult, ToSchema)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
    pub unit_id: Option<i32>,
    pub unit_name: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    activity: ActivityLogService,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, activity: ActivityLogService) -> Self {
        Self { db, activity }
    }

    async fn username_taken(
        &self,
        username: &str,
        excluding: Option<i64>,
    ) -> Result<bool, ServiceError> {
        let mut query = UserEntity::find().filter(user::Column::Username.eq(username));
        if let Some(id) = excluding {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(&*self.db).await? > 0)
    }

    async fn check_unit_reference(&self, unit_id: i32) -> Result<(), ServiceError> {
        UnitEntity::find_by_id(unit_id)
            .one(&*self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::ValidationError(format!("unknown unit {unit_id}")))
    }

    /// All accounts with unit names resolved, newest first.
    #[instrument(skip(self, ctx))]
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<UserRow>, ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        let rows = UserEntity::find()
            .select_only()
            .columns([
                user::Column::Id,
                user::Column::Username,
                user::Column::Name,
                user::Column::Role,
                user::Column::UnitId,
                user::Column::IsActive,
                user::Column::CreatedAt,
            ])
            .column_as(unit::Column::Name, "unit_name")
            .join(JoinType::LeftJoin, user::Relation::Unit.def())
            .order_by_desc(user::Column::CreatedAt)
            .into_model::<UserRow>()
            .all(&*self.db)
            .await?;

        Ok(rows)
    }

    /// One account with its unit name resolved.
    #[instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &RequestContext, id: i64) -> Result<UserRow, ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        UserEntity::find()
            .select_only()
            .columns([
                user::Column::Id,
                user::Column::Username,
                user::Column::Name,
                user::Column::Role,
                user::Column::UnitId,
                user::Column::IsActive,
                user::Column::CreatedAt,
            ])
            .column_as(unit::Column::Name, "unit_name")
            .join(JoinType::LeftJoin, user::Relation::Unit.def())
            .filter(user::Column::Id.eq(id))
            .into_model::<UserRow>()
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateUserRequest,
    ) -> Result<UserModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        if self.username_taken(&request.username, None).await? {
            return Err(ServiceError::Conflict(format!(
                "username {} already exists",
                request.username
            )));
        }
        if let Some(unit_id) = request.unit_id {
            self.check_unit_reference(unit_id).await?;
        }

        let model = user::ActiveModel {
            username: Set(request.username),
            password_hash: Set(hash_password(&request.password)?),
            name: Set(request.name.clone()),
            role: Set(request.role.as_str().to_string()),
            unit_id: Set(request.unit_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CREATE_USER,
                table_name: Some(tables::USERS),
                record_id: Some(created.id),
                details: Some(format!("created user {} ({})", created.name, created.role)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        info!(user_id = created.id, "user created");
        Ok(created)
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id, user_id = id))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<UserModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;
        request.validate()?;

        let account = UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))?;

        if self.username_taken(&request.username, Some(id)).await? {
            return Err(ServiceError::Conflict(format!(
                "username {} already exists",
                request.username
            )));
        }
        if let Some(unit_id) = request.unit_id {
            self.check_unit_reference(unit_id).await?;
        }

        let mut model = account.into_active_model();
        model.username = Set(request.username);
        model.name = Set(request.name);
        model.role = Set(request.role.as_str().to_string());
        model.unit_id = Set(request.unit_id);
        model.is_active = Set(request.is_active);
        let updated = model.update(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::EDIT_USER,
                table_name: Some(tables::USERS),
                record_id: Some(id),
                details: Some(format!("edited user {}", updated.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(updated)
    }

    /// Hard delete; own account is protected.
    #[instrument(skip(self, ctx), fields(admin_id = ctx.user_id, user_id = id))]
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        if id == ctx.user_id {
            return Err(ServiceError::BadRequest(
                "cannot delete your own account".to_string(),
            ));
        }

        let account = UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))?;

        UserEntity::delete_by_id(id).exec(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::DELETE_USER,
                table_name: Some(tables::USERS),
                record_id: Some(id),
                details: Some(format!("deleted user {}", account.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(())
    }

    #[instrument(skip(self, ctx, request), fields(admin_id = ctx.user_id, user_id = id))]
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        id: i64,
        request: ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        if request.new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::ValidationError(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let account = UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))?;

        let mut model = account.into_active_model();
        model.password_hash = Set(hash_password(&request.new_password)?);
        model.update(&*self.db).await?;

        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action: actions::CHANGE_PASSWORD,
                table_name: Some(tables::USERS),
                record_id: Some(id),
                details: None,
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(())
    }

    /// Toggles the account flag; deactivating your own account is rejected.
    #[instrument(skip(self, ctx), fields(admin_id = ctx.user_id, user_id = id))]
    pub async fn set_active(
        &self,
        ctx: &RequestContext,
        id: i64,
        is_active: bool,
    ) -> Result<UserModel, ServiceError> {
        ctx.require(Role::SystemAdmin)?;

        if id == ctx.user_id && !is_active {
            return Err(ServiceError::BadRequest(
                "cannot deactivate your own account".to_string(),
            ));
        }

        let account = UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))?;

        let mut model = account.into_active_model();
        model.is_active = Set(is_active);
        let updated = model.update(&*self.db).await?;

        let action = if is_active {
            actions::ENABLE_USER
        } else {
            actions::DISABLE_USER
        };
        self.activity
            .record(ActivityEntry {
                user_id: Some(ctx.user_id),
                action,
                table_name: Some(tables::USERS),
                record_id: Some(id),
                details: Some(format!("{} user {}", action, updated.name)),
                ip_address: ctx.ip_address.clone(),
            })
            .await;

        Ok(updated)
    }
}

/// Creates the initial administrator account on an empty users table.
/// Invoked once at startup when configured; a no-op otherwise.
pub async fn ensure_bootstrap_admin(
    db: &Arc<DbPool>,
    password: &str,
) -> Result<Option<UserModel>, ServiceError> {
    if UserEntity::find().count(&**db).await? > 0 {
        return Ok(None);
    }

    let model = user::ActiveModel {
        username: Set("admin".to_string()),
        password_hash: Set(hash_password(password)?),
        name: Set("System Administrator".to_string()),
        role: Set(Role::SystemAdmin.as_str().to_string()),
        unit_id: Set(None),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = model.insert(&**db).await?;
    info!(user_id = created.id, "bootstrap administrator created");
    Ok(Some(created))
}
