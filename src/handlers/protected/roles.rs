// handlers/protected/roles.rs - /api/roles handlers (admin only)

use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use super::parse_id;
use crate::app::AppState;
use crate::auth::Capability;
use crate::database::models::Role;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::role_service::RoleRequest;
use crate::services::RoleService;

pub async fn roles_list(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Role>> {
    user.require(Capability::ManageRoles)?;
    let roles = RoleService::new(&state).list().await?;
    Ok(ApiResponse::success(roles).with_message("Roles retrieved"))
}

pub async fn role_get(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Role> {
    user.require(Capability::ManageRoles)?;
    let role = RoleService::new(&state).get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(role).with_message("Role retrieved"))
}

pub async fn role_create(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<Role> {
    user.require(Capability::ManageRoles)?;
    let Json(req) = payload?;
    let role = RoleService::new(&state).create(req).await?;
    Ok(ApiResponse::created(role).with_message("Role created"))
}

pub async fn role_update(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<Role> {
    user.require(Capability::ManageRoles)?;
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let role = RoleService::new(&state).update(id, req).await?;
    Ok(ApiResponse::success(role).with_message("Role updated"))
}

/// Refused with 409 while any alumnus still holds the role.
pub async fn role_delete(
    Extension(state): Extension<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    user.require(Capability::ManageRoles)?;
    RoleService::new(&state).delete(parse_id(&id)?).await?;
    Ok(ApiResponse::success(()).with_message("Role deleted"))
}
