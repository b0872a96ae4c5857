use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::with_timeout;
use crate::app::AppState;
use crate::auth::{generate_jwt, verify_password, Claims, Role};
use crate::config::config;
use crate::database::Store;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: LoginUser,
    pub token: String,
}

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub struct AuthService {
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self { store: state.store.clone() }
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let email = req.email.as_deref().map(str::trim).unwrap_or_default();
        let password = req.password.as_deref().unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request("Email and password are required"));
        }

        let timeout = config().database.query_timeout_secs;
        let alumnus = with_timeout(timeout, self.store.get_alumnus_by_email(email))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch account", e))?;
        let Some(alumnus) = alumnus.filter(|a| verify_password(password, &a.password_hash)) else {
            warn!("Rejected login for {}", email);
            return Err(ApiError::unauthorized(BAD_CREDENTIALS));
        };

        let role_name = with_timeout(timeout, self.store.get_role(alumnus.role_id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch role", e))?
            .map(|r| r.name)
            .unwrap_or_default();
        let role = Role::from_name(&role_name).ok_or_else(|| {
            warn!("Login for {} refused: role {:?} has no access", email, role_name);
            ApiError::forbidden("Your role is not permitted to sign in")
        })?;

        let token = generate_jwt(&Claims::new(alumnus.id, alumnus.email.clone(), role))?;
        info!("User {} logged in as {}", alumnus.id, role.as_str());
        Ok(LoginResponse { user: LoginUser { id: alumnus.id, email: alumnus.email, role }, token })
    }
}
