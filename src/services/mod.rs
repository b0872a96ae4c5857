use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::database::StoreError;
use crate::error::ApiError;

pub mod alumni_service;
pub mod auth_service;
pub mod employment_service;
pub mod role_service;

pub use alumni_service::AlumniService;
pub use auth_service::AuthService;
pub use employment_service::EmploymentService;
pub use role_service::RoleService;

/// Bounds a store call. On expiry the call is dropped, which cancels any
/// in-flight database query.
pub(crate) async fn with_timeout<T, F>(secs: u64, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(secs)),
    }
}

/// Accumulates per-field validation failures.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Returns the trimmed value, recording an error when it is missing or blank.
    pub fn required(&mut self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                self.add(field, "This field is required");
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Validation failed", Some(self.0)))
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    matches!((parts.next(), parts.next(), parts.next()), (Some(local), Some(domain), None)
        if !local.is_empty() && !domain.is_empty())
}

/// Trims optional text and drops it when blank.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
