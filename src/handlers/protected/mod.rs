// handlers/protected/mod.rs - Handlers behind jwt_auth_middleware
//
// Every handler here receives the caller as `Extension<AuthUser>` and checks
// the capability it needs before touching the store.

pub mod alumni;
pub mod employment;
pub mod profile;
pub mod roles;

use crate::error::ApiError;

pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| ApiError::bad_request(format!("Invalid id: {}", raw)))
}
