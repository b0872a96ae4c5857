// handlers/protected/profile.rs - GET /api/profile handler

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/profile - identity carried by the caller's token
pub async fn profile_get(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user_id": user.user_id,
        "email": user.email,
        "role": user.role,
    }))
    .with_message("Profile retrieved"))
}
