use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

use crate::auth::RequestContext;
use crate::entities::unit::Model as UnitModel;
use crate::errors::ServiceError;
use crate::services::units::{CreateUnitRequest, UpdateUnitRequest};
use crate::{ApiResponse, AppState};

/// Build the units Router scoped under `/api/v1/units`.
pub fn unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/{id}", put(update_unit))
        .route("/{id}/active", post(set_active))
}

#[derive(Debug, Deserialize)]
pub struct UnitListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetUnitActiveRequest {
    pub is_active: bool,
}

/// List units (active only unless requested otherwise)
#[utoipa::path(
    get,
    path = "/api/v1/units",
    responses((status = 200, description = "Units retrieved", body = ApiResponse<Vec<UnitModel>>)),
    security(("Bearer" = [])),
    tag = "Units"
)]
pub async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<UnitListQuery>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<UnitModel>>>, ServiceError> {
    let units = state.services.units.list(query.include_inactive).await?;
    Ok(Json(ApiResponse::success(units)))
}

async fn create_unit(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(request): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UnitModel>>), ServiceError> {
    let created = state.services.units.create(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn update_unit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ctx: RequestContext,
    Json(request): Json<UpdateUnitRequest>,
) -> Result<Json<ApiResponse<UnitModel>>, ServiceError> {
    let updated = state.services.units.update(&ctx, id, request).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ctx: RequestContext,
    Json(request): Json<SetUnitActiveRequest>,
) -> Result<Json<ApiResponse<UnitModel>>, ServiceError> {
    let updated = state
        .services
        .units
        .set_active(&ctx, id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
