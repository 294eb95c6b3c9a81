use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};

use crate::auth::RequestContext;
use crate::entities::dispense_type::Model as DispenseTypeModel;
use crate::entities::receipt_status::Model as ReceiptStatusModel;
use crate::errors::ServiceError;
use crate::services::reference::DispenseTypeRequest;
use crate::{ApiResponse, AppState};

/// Build the reference data Router scoped under `/api/v1`.
pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dispense-types",
            get(list_dispense_types).post(create_dispense_type),
        )
        .route("/dispense-types/{id}", put(update_dispense_type))
        .route("/receipt-statuses", get(list_receipt_statuses))
}

/// List dispense types
#[utoipa::path(
    get,
    path = "/api/v1/dispense-types",
    responses((status = 200, description = "Dispense types retrieved", body = ApiResponse<Vec<DispenseTypeModel>>)),
    security(("Bearer" = [])),
    tag = "Reference"
)]
pub async fn list_dispense_types(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<DispenseTypeModel>>>, ServiceError> {
    let types = state.services.reference.dispense_types().await?;
    Ok(Json(ApiResponse::success(types)))
}

/// List receipt statuses
#[utoipa::path(
    get,
    path = "/api/v1/receipt-statuses",
    responses((status = 200, description = "Receipt statuses retrieved", body = ApiResponse<Vec<ReceiptStatusModel>>)),
    security(("Bearer" = [])),
    tag = "Reference"
)]
pub async fn list_receipt_statuses(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<ReceiptStatusModel>>>, ServiceError> {
    let statuses = state.services.reference.receipt_statuses().await?;
    Ok(Json(ApiResponse::success(statuses)))
}

async fn create_dispense_type(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<DispenseTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DispenseTypeModel>>), ServiceError> {
    let created = state
        .services
        .reference
        .create_dispense_type(&ctx, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn update_dispense_type(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ctx: RequestContext,
    Json(request): Json<DispenseTypeRequest>,
) -> Result<Json<ApiResponse<DispenseTypeModel>>, ServiceError> {
    let updated = state
        .services
        .reference
        .update_dispense_type(&ctx, id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
