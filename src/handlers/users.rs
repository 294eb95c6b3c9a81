use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::auth::RequestContext;
use crate::entities::user::Model as UserModel;
use crate::errors::ServiceError;
use crate::services::users::{
    ChangePasswordRequest, CreateUserRequest, SetActiveRequest, UpdateUserRequest, UserRow,
};
use crate::{ApiResponse, AppState};

/// Build the user administration Router scoped under `/api/v1/admin/users`.
pub fn user_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/change-password", post(change_password))
        .route("/{id}/active", post(set_active))
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses((status = 200, description = "Users retrieved", body = ApiResponse<Vec<UserRow>>)),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<UserRow>>>, ServiceError> {
    let users = state.services.users.list(&ctx).await?;
    Ok(Json(ApiResponse::success(users)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<UserRow>>, ServiceError> {
    let account = state.services.users.get(&ctx, id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserModel>),
        (status = 409, description = "Username already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserModel>>), ServiceError> {
    let created = state.services.users.create(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserModel>>, ServiceError> {
    let updated = state.services.users.update(&ctx, id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.users.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.users.change_password(&ctx, id, request).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<UserModel>>, ServiceError> {
    let updated = state
        .services
        .users
        .set_active(&ctx, id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
