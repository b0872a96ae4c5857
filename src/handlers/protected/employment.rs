// handlers/protected/employment.rs - /api/employment handlers

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use super::parse_id;
use crate::app::AppState;
use crate::auth::Capability;
use crate::config::config;
use crate::database::models::EmploymentRecord;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::query::{ListParams, ListQuery, Paginated};
use crate::services::employment_service::EmploymentRequest;
use crate::services::EmploymentService;

/// GET /api/employment - live records only
pub async fn employment_list(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Paginated<EmploymentRecord>> {
    user.require(Capability::ReadDirectory)?;
    let mut query = ListQuery::from_params(&params, config().api.default_limit);
    query.limit = config().clamp_limit(query.limit);

    let page = EmploymentService::new(&state).list(&query).await?;
    Ok(ApiResponse::success(page).with_message("Employment records retrieved"))
}

/// GET /api/employment/:id
pub async fn employment_get(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<EmploymentRecord> {
    user.require(Capability::ReadDirectory)?;
    let record = EmploymentService::new(&state).get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(record).with_message("Employment record retrieved"))
}

/// GET /api/employment/alumni/:alumni_id (admin)
pub async fn employment_by_alumnus(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(alumni_id): Path<String>,
) -> ApiResult<Vec<EmploymentRecord>> {
    user.require(Capability::ManageEmployment)?;
    let records = EmploymentService::new(&state).by_alumnus(parse_id(&alumni_id)?).await?;
    Ok(ApiResponse::success(records).with_message("Employment records retrieved"))
}

/// POST /api/employment (admin)
pub async fn employment_create(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<EmploymentRequest>, JsonRejection>,
) -> ApiResult<EmploymentRecord> {
    user.require(Capability::ManageEmployment)?;
    let Json(req) = payload?;
    let record = EmploymentService::new(&state).create(req).await?;
    Ok(ApiResponse::created(record).with_message("Employment record created"))
}

/// PUT /api/employment/:id (admin) - full replacement
pub async fn employment_update(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<EmploymentRequest>, JsonRejection>,
) -> ApiResult<EmploymentRecord> {
    user.require(Capability::ManageEmployment)?;
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let record = EmploymentService::new(&state).update(id, req).await?;
    Ok(ApiResponse::success(record).with_message("Employment record updated"))
}

/// DELETE /api/employment/:id (admin)
pub async fn employment_delete(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    user.require(Capability::ManageEmployment)?;
    EmploymentService::new(&state).delete(parse_id(&id)?).await?;
    Ok(ApiResponse::success(()).with_message("Employment record deleted"))
}

/// PUT /api/employment/:id/soft-delete (owner or admin)
pub async fn employment_soft_delete(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<EmploymentRecord> {
    let record = EmploymentService::new(&state).soft_delete(&user, parse_id(&id)?).await?;
    Ok(ApiResponse::success(record).with_message("Employment record moved to trash"))
}

/// PUT /api/employment/:id/restore (owner or admin)
pub async fn employment_restore(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<EmploymentRecord> {
    let record = EmploymentService::new(&state).restore(&user, parse_id(&id)?).await?;
    Ok(ApiResponse::success(record).with_message("Employment record restored"))
}

/// DELETE /api/employment/:id/hard-delete (owner or admin, trashed records only)
pub async fn employment_hard_delete(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    EmploymentService::new(&state).hard_delete(&user, parse_id(&id)?).await?;
    Ok(ApiResponse::success(()).with_message("Employment record permanently deleted"))
}

/// GET /api/employment/trash
pub async fn employment_trash(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Paginated<EmploymentRecord>> {
    let query = ListQuery::from_params(&params, config().api.default_limit);
    let limit = config().clamp_limit(query.limit);

    let page = EmploymentService::new(&state).trash(&user, query.page, limit).await?;
    Ok(ApiResponse::success(page).with_message("Deleted employment records retrieved"))
}
