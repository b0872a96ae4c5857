// handlers/protected/alumni.rs - /api/alumni handlers

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};

use super::parse_id;
use crate::app::AppState;
use crate::auth::Capability;
use crate::config::config;
use crate::database::models::Alumnus;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::query::{EmploymentStatusView, ListParams, ListQuery, Paginated};
use crate::services::alumni_service::{AlumnusCheck, CheckAlumnusParams, CreateAlumnusRequest, UpdateAlumnusRequest};
use crate::services::AlumniService;

/// GET /api/alumni - paginated, searchable, sortable directory
pub async fn alumni_list(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListParams>,
) -> ApiResult<Paginated<Alumnus>> {
    user.require(Capability::ReadDirectory)?;
    let mut query = ListQuery::from_params(&params, config().api.default_limit);
    query.limit = config().clamp_limit(query.limit);

    let page = AlumniService::new(&state).list(&query).await?;
    Ok(ApiResponse::success(page).with_message("Alumni retrieved"))
}

/// GET /api/alumni/check?key=&nim= - is this student number an alumnus
pub async fn alumni_check(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CheckAlumnusParams>,
) -> ApiResult<AlumnusCheck> {
    user.require(Capability::ReadDirectory)?;
    let check = AlumniService::new(&state).check(&params).await?;
    let message = if check.is_alumni { "Alumnus found" } else { "Not an alumnus" };
    Ok(ApiResponse::success(check).with_message(message))
}

/// GET /api/alumni/:id
pub async fn alumni_get(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Alumnus> {
    user.require(Capability::ReadDirectory)?;
    let alumnus = AlumniService::new(&state).get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(alumnus).with_message("Alumnus retrieved"))
}

/// POST /api/alumni (admin)
pub async fn alumni_create(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateAlumnusRequest>, JsonRejection>,
) -> ApiResult<Alumnus> {
    user.require(Capability::ManageAlumni)?;
    let Json(req) = payload?;
    let alumnus = AlumniService::new(&state).create(req).await?;
    Ok(ApiResponse::created(alumnus).with_message("Alumnus created"))
}

/// PUT /api/alumni/:id (admin) - partial update
pub async fn alumni_update(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAlumnusRequest>, JsonRejection>,
) -> ApiResult<Alumnus> {
    user.require(Capability::ManageAlumni)?;
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let alumnus = AlumniService::new(&state).update(id, req).await?;
    Ok(ApiResponse::success(alumnus).with_message("Alumnus updated"))
}

/// DELETE /api/alumni/:id (admin) - also removes the alumnus' employment records
pub async fn alumni_delete(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    user.require(Capability::ManageAlumni)?;
    AlumniService::new(&state).delete(parse_id(&id)?).await?;
    Ok(ApiResponse::success(()).with_message("Alumnus deleted"))
}

/// GET /api/alumni/employment-status
///
/// Filters: `id`, `nama`/`name`, `jurusan`/`major`, `angkatan`/`cohort`,
/// `bidang_industri`/`industry`, `nama_perusahaan`/`company`,
/// `posisi_jabatan`/`position`, `lebih_dari_1_tahun`/`more_than_one_year`.
/// Values that do not parse are ignored.
pub async fn employment_status_get(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<EmploymentStatusView>> {
    user.require(Capability::ReadDirectory)?;
    let service = AlumniService::new(&state);
    let mut query = service.status_query(&params, config().api.status_default_limit);
    query.limit = config().clamp_limit(query.limit);

    let (views, pagination) = service.employment_status(&query).await?;
    Ok(ApiResponse::success(views).with_message("Employment status retrieved").with_pagination(pagination))
}
