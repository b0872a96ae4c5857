// handlers/public/login.rs - POST /api/login handler

use axum::{extract::rejection::JsonRejection, Extension, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth_service::{LoginRequest, LoginResponse};
use crate::services::AuthService;

/// POST /api/login - exchange email and password for a JWT.
///
/// Unknown email and wrong password produce the same 401 so the response
/// does not reveal which accounts exist.
pub async fn login_post(
    Extension(state): Extension<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(req) = payload?;
    let response = AuthService::new(&state).login(req).await?;
    Ok(ApiResponse::success(response).with_message("Login successful"))
}
