use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use super::{with_timeout, FieldErrors};
use crate::app::AppState;
use crate::config::config;
use crate::database::models::Role;
use crate::database::{Store, StoreError};
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RoleRequest {
    pub name: Option<String>,
}

pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(state: &AppState) -> Self {
        Self { store: state.store.clone() }
    }

    fn timeout() -> u64 {
        config().database.query_timeout_secs
    }

    pub async fn list(&self) -> Result<Vec<Role>, ApiError> {
        with_timeout(Self::timeout(), self.store.list_roles())
            .await
            .map_err(|e| ApiError::storage("Failed to fetch roles", e))
    }

    pub async fn get(&self, id: i64) -> Result<Role, ApiError> {
        with_timeout(Self::timeout(), self.store.get_role(id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch role", e))?
            .ok_or_else(|| Self::missing(id))
    }

    pub async fn create(&self, req: RoleRequest) -> Result<Role, ApiError> {
        let name = Self::validate(req)?;
        let role = with_timeout(Self::timeout(), self.store.create_role(&name))
            .await
            .map_err(|e| ApiError::storage("Failed to create role", e))?;
        info!("Created role {} ({})", role.id, role.name);
        Ok(role)
    }

    pub async fn update(&self, id: i64, req: RoleRequest) -> Result<Role, ApiError> {
        let name = Self::validate(req)?;
        let role = with_timeout(Self::timeout(), self.store.update_role(id, &name))
            .await
            .map_err(|e| ApiError::storage("Failed to update role", e))?
            .ok_or_else(|| Self::missing(id))?;
        info!("Renamed role {} to {}", id, role.name);
        Ok(role)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let deleted = match with_timeout(Self::timeout(), self.store.delete_role(id)).await {
            Ok(deleted) => deleted,
            Err(StoreError::Conflict(_)) => {
                return Err(ApiError::conflict("Role is still assigned to one or more alumni"))
            }
            Err(e) => return Err(ApiError::storage("Failed to delete role", e)),
        };
        if !deleted {
            return Err(Self::missing(id));
        }
        info!("Deleted role {}", id);
        Ok(())
    }

    fn validate(req: RoleRequest) -> Result<String, ApiError> {
        let mut errors = FieldErrors::default();
        let name = errors.required("name", req.name.as_deref());
        errors.finish()?;
        Ok(name)
    }

    fn missing(id: i64) -> ApiError {
        ApiError::not_found(format!("Role {} not found", id))
    }
}
