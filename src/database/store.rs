use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{Alumnus, AlumnusChanges, EmploymentInput, EmploymentRecord, NewAlumnus, Role};
use crate::filter::{Filter, FilterError};
use crate::query::{EmploymentStatusQuery, EmploymentStatusView};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => return StoreError::Conflict(db_err.message().to_string()),
                // foreign_key_violation
                Some("23503") => return StoreError::Conflict(db_err.message().to_string()),
                _ => {}
            }
        }
        StoreError::Sqlx(err)
    }
}

/// Storage operations shared by the relational and document backends.
///
/// Listing methods take a prepared [`Filter`] and return the requested page
/// together with the total number of matching rows.
#[async_trait]
pub trait Store: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_alumni(&self, filter: &Filter) -> Result<(Vec<Alumnus>, i64), StoreError>;
    async fn get_alumnus(&self, id: i64) -> Result<Option<Alumnus>, StoreError>;
    async fn get_alumnus_by_email(&self, email: &str) -> Result<Option<Alumnus>, StoreError>;
    async fn create_alumnus(&self, alumnus: NewAlumnus) -> Result<Alumnus, StoreError>;
    async fn update_alumnus(&self, id: i64, changes: AlumnusChanges) -> Result<Option<Alumnus>, StoreError>;
    /// Removes the alumnus and every employment record it owns.
    async fn delete_alumnus(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_employment(&self, filter: &Filter) -> Result<(Vec<EmploymentRecord>, i64), StoreError>;
    /// Returns the record whether or not it is soft-deleted.
    async fn get_employment(&self, id: i64) -> Result<Option<EmploymentRecord>, StoreError>;
    async fn create_employment(&self, input: EmploymentInput) -> Result<EmploymentRecord, StoreError>;
    async fn update_employment(&self, id: i64, input: EmploymentInput) -> Result<Option<EmploymentRecord>, StoreError>;
    async fn set_employment_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Option<EmploymentRecord>, StoreError>;
    async fn delete_employment(&self, id: i64) -> Result<bool, StoreError>;

    async fn employment_status(
        &self,
        query: &EmploymentStatusQuery,
    ) -> Result<(Vec<EmploymentStatusView>, i64), StoreError>;

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;
    async fn get_role(&self, id: i64) -> Result<Option<Role>, StoreError>;
    async fn create_role(&self, name: &str) -> Result<Role, StoreError>;
    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, StoreError>;
    /// Fails with `Conflict` while any alumnus still references the role.
    async fn delete_role(&self, id: i64) -> Result<bool, StoreError>;
}
