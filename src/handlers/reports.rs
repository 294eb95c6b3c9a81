use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{RequestContext, Role};
use crate::errors::ServiceError;
use crate::services::reports::{
    ActiveUser, DailyConsumption, DispenseTypeStats, MonthlyConsumption, OverviewReport,
    StatusCount, TodayStats, UnitConsumption,
};
use crate::{ApiResponse, AppState};

/// Build the reports Router scoped under `/api/v1/reports`.
pub fn reports_routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/today", get(get_today_stats))
        .route("/daily", get(get_daily_consumption))
        .route("/monthly", get(get_monthly_consumption))
        .route("/units", get(get_unit_consumption))
        .route("/statuses", get(get_status_distribution))
        .route("/dispense-types", get(get_dispense_type_stats))
        .route("/active-users", get(get_active_users))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyWindowQuery {
    /// Number of trailing days (default: 7)
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthlyWindowQuery {
    /// Number of trailing months (default: 12)
    pub months: Option<u32>,
}

/// Administrator overview with global counters and recent records
#[utoipa::path(
    get,
    path = "/api/v1/reports/overview",
    responses((status = 200, description = "Overview retrieved", body = ApiResponse<OverviewReport>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_overview(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<OverviewReport>>, ServiceError> {
    ctx.require(Role::SystemManager)?;
    let overview = state.services.reports.overview().await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// Today's counts, dispensed/pending split, and fuel totals
#[utoipa::path(
    get,
    path = "/api/v1/reports/today",
    responses((status = 200, description = "Today's stats retrieved", body = ApiResponse<TodayStats>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_today_stats(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<TodayStats>>, ServiceError> {
    let stats = state.services.reports.today_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Per-day fuel totals over a trailing window
#[utoipa::path(
    get,
    path = "/api/v1/reports/daily",
    params(DailyWindowQuery),
    responses(
        (status = 200, description = "Daily totals retrieved", body = ApiResponse<Vec<DailyConsumption>>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_daily_consumption(
    State(state): State<AppState>,
    Query(params): Query<DailyWindowQuery>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<DailyConsumption>>>, ServiceError> {
    let days = params.days.unwrap_or(7);
    if days == 0 || days > 90 {
        return Err(ServiceError::ValidationError(
            "days must be between 1 and 90".to_string(),
        ));
    }

    let totals = state.services.reports.daily_consumption(days).await?;
    Ok(Json(ApiResponse::success(totals)))
}

/// Per-month fuel totals over a trailing window
#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly",
    params(MonthlyWindowQuery),
    responses(
        (status = 200, description = "Monthly totals retrieved", body = ApiResponse<Vec<MonthlyConsumption>>),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_monthly_consumption(
    State(state): State<AppState>,
    Query(params): Query<MonthlyWindowQuery>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<MonthlyConsumption>>>, ServiceError> {
    let months = params.months.unwrap_or(12);
    if months == 0 || months > 36 {
        return Err(ServiceError::ValidationError(
            "months must be between 1 and 36".to_string(),
        ));
    }

    let totals = state.services.reports.monthly_consumption(months).await?;
    Ok(Json(ApiResponse::success(totals)))
}

/// Per-unit totals sorted by combined volume
#[utoipa::path(
    get,
    path = "/api/v1/reports/units",
    responses((status = 200, description = "Unit totals retrieved", body = ApiResponse<Vec<UnitConsumption>>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_unit_consumption(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<UnitConsumption>>>, ServiceError> {
    let totals = state.services.reports.unit_consumption().await?;
    Ok(Json(ApiResponse::success(totals)))
}

/// Operation count per receipt status, including zero-count statuses
#[utoipa::path(
    get,
    path = "/api/v1/reports/statuses",
    responses((status = 200, description = "Status distribution retrieved", body = ApiResponse<Vec<StatusCount>>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_status_distribution(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<StatusCount>>>, ServiceError> {
    let distribution = state.services.reports.status_distribution().await?;
    Ok(Json(ApiResponse::success(distribution)))
}

/// Operation count and totals per dispense type
#[utoipa::path(
    get,
    path = "/api/v1/reports/dispense-types",
    responses((status = 200, description = "Dispense type stats retrieved", body = ApiResponse<Vec<DispenseTypeStats>>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_dispense_type_stats(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<DispenseTypeStats>>>, ServiceError> {
    let stats = state.services.reports.dispense_type_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Users with a login recorded today
#[utoipa::path(
    get,
    path = "/api/v1/reports/active-users",
    responses((status = 200, description = "Active users retrieved", body = ApiResponse<Vec<ActiveUser>>)),
    security(("Bearer" = [])),
    tag = "Reports"
)]
pub async fn get_active_users(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<ActiveUser>>>, ServiceError> {
    ctx.require(Role::SystemManager)?;
    let users = state.services.reports.active_users_today().await?;
    Ok(Json(ApiResponse::success(users)))
}
