use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::auth::RequestContext;
use crate::errors::ServiceError;
use crate::services::operations::{
    CreateOperationRequest, DispenseRequest, OperationDetail, OperationFilter,
    OperationListResponse, OperationResponse, UpdateOperationRequest,
};
use crate::{ApiResponse, AppState};

/// List operations with filtering and pagination
#[utoipa::path(
    get,
    path = "/api/v1/operations",
    params(OperationFilter),
    responses(
        (status = 200, description = "Operations retrieved successfully", body = ApiResponse<OperationListResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn list_operations(
    State(state): State<AppState>,
    Query(filter): Query<OperationFilter>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<OperationListResponse>>, ServiceError> {
    let result = state.services.operations.list(filter).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Get one operation with audit-derived fields
#[utoipa::path(
    get,
    path = "/api/v1/operations/{id}",
    params(("id" = i64, Path, description = "Operation id")),
    responses(
        (status = 200, description = "Operation retrieved successfully", body = ApiResponse<OperationDetail>),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<OperationDetail>>, ServiceError> {
    let detail = state.services.operations.get(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// Create an operation; assigns the next receipt number
#[utoipa::path(
    post,
    path = "/api/v1/operations",
    request_body = CreateOperationRequest,
    responses(
        (status = 201, description = "Operation created", body = ApiResponse<OperationResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn create_operation(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<CreateOperationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OperationResponse>>), ServiceError> {
    let created = state.services.operations.create(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Edit a pending operation (creator only)
#[utoipa::path(
    put,
    path = "/api/v1/operations/{id}",
    params(("id" = i64, Path, description = "Operation id")),
    request_body = UpdateOperationRequest,
    responses(
        (status = 200, description = "Operation updated", body = ApiResponse<OperationResponse>),
        (status = 403, description = "Not the creating user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Operation already dispensed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn update_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(request): Json<UpdateOperationRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ServiceError> {
    let updated = state.services.operations.update(&ctx, id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Mark a receipt as dispensed
#[utoipa::path(
    post,
    path = "/api/v1/operations/{id}/dispense",
    params(("id" = i64, Path, description = "Operation id")),
    request_body = DispenseRequest,
    responses(
        (status = 200, description = "Receipt dispensed", body = ApiResponse<OperationResponse>),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Receipt already dispensed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn dispense_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
    Json(request): Json<DispenseRequest>,
) -> Result<Json<ApiResponse<OperationResponse>>, ServiceError> {
    let updated = state.services.operations.dispense(&ctx, id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete an operation (hard delete; the receipt number is never reused)
#[utoipa::path(
    delete,
    path = "/api/v1/operations/{id}",
    params(("id" = i64, Path, description = "Operation id")),
    responses(
        (status = 200, description = "Operation deleted"),
        (status = 404, description = "Operation not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn delete_operation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<()>>, ServiceError> {
    state.services.operations.delete(&ctx, id).await?;
    Ok(Json(ApiResponse::success(())))
}

/// Distinct months with recorded operations (filter dropdowns)
#[utoipa::path(
    get,
    path = "/api/v1/operations/months",
    responses((status = 200, description = "Months retrieved", body = ApiResponse<Vec<String>>)),
    security(("Bearer" = [])),
    tag = "Operations"
)]
pub async fn list_months(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<String>>>, ServiceError> {
    let months = state.services.operations.months().await?;
    Ok(Json(ApiResponse::success(months)))
}
