use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{RequestContext, Role};
use crate::errors::ServiceError;
use crate::services::activity_log::ActivityLogRow;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Restrict to one entity type (e.g. "fuel_operations")
    pub table_name: Option<String>,
    /// Number of entries to return (default 20, max 100)
    pub limit: Option<u64>,
}

/// Recent activity log entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/activity",
    params(ActivityQuery),
    responses((status = 200, description = "Activity entries retrieved", body = ApiResponse<Vec<ActivityLogRow>>)),
    security(("Bearer" = [])),
    tag = "Activity"
)]
pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<ActivityLogRow>>>, ServiceError> {
    ctx.require(Role::SystemManager)?;

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let entries = state
        .services
        .activity
        .recent(query.table_name.as_deref(), limit)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}
