use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_jwt, Capability, Claims, Role};
use crate::error::ApiError;

/// Authenticated caller, injected by [`jwt_auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.user_id, email: claims.email, role: claims.role }
    }
}

impl AuthUser {
    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient permissions for this operation"))
        }
    }

    /// Admins act on any employment record; users only on their own.
    pub fn require_owner_or_admin(&self, alumni_id: i64) -> Result<(), ApiError> {
        if self.role == Role::Admin || self.user_id == alumni_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("You can only modify your own employment records"))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let claims = match extract_jwt_from_headers(&headers).and_then(|token| validate_jwt(&token).map_err(ApiError::from)) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let auth_str =
        auth_header.to_str().map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(ApiError::unauthorized("Empty JWT token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
