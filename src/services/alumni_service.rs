use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::info;

use super::{is_valid_email, optional_text, with_timeout, FieldErrors};
use crate::app::AppState;
use crate::auth::hash_password;
use crate::clock::Clock;
use crate::config::config;
use crate::database::models::{Alumnus, AlumnusChanges, NewAlumnus};
use crate::database::Store;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::query::{
    EmploymentStatusQuery, EmploymentStatusView, Entity, ListMeta, ListQuery, ListSpec, Paginated, StatusPagination,
};

#[derive(Debug, Default, Deserialize)]
pub struct CreateAlumnusRequest {
    #[serde(alias = "nim")]
    pub student_number: Option<String>,
    #[serde(alias = "nama")]
    pub name: Option<String>,
    #[serde(alias = "jurusan")]
    pub major: Option<String>,
    #[serde(alias = "angkatan")]
    pub cohort: Option<i32>,
    #[serde(alias = "tahun_lulus")]
    pub graduation_year: Option<i32>,
    pub email: Option<String>,
    #[serde(alias = "no_telepon")]
    pub phone: Option<String>,
    #[serde(alias = "alamat")]
    pub address: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
}

/// Partial update. For `phone` and `address` an absent key leaves the value
/// alone, while `null` or blank text clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAlumnusRequest {
    #[serde(alias = "nim")]
    pub student_number: Option<String>,
    #[serde(alias = "nama")]
    pub name: Option<String>,
    #[serde(alias = "jurusan")]
    pub major: Option<String>,
    #[serde(alias = "angkatan")]
    pub cohort: Option<i32>,
    #[serde(alias = "tahun_lulus")]
    pub graduation_year: Option<i32>,
    pub email: Option<String>,
    #[serde(alias = "no_telepon", default, deserialize_with = "nullable_text")]
    pub phone: Option<Option<String>>,
    #[serde(alias = "alamat", default, deserialize_with = "nullable_text")]
    pub address: Option<Option<String>>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
}

fn nullable_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckAlumnusParams {
    pub key: Option<String>,
    #[serde(alias = "student_number")]
    pub nim: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlumnusCheck {
    #[serde(rename = "isAlumni")]
    pub is_alumni: bool,
    pub alumni: Option<Alumnus>,
}

pub struct AlumniService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl AlumniService {
    pub fn new(state: &AppState) -> Self {
        Self { store: state.store.clone(), clock: state.clock.clone() }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<Alumnus>, ApiError> {
        let spec = ListSpec::build(Entity::Alumni, query);
        let filter = spec.filter()?;
        let (items, total) = with_timeout(config().database.query_timeout_secs, self.store.find_alumni(&filter))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch alumni", e))?;
        Ok(Paginated { items, meta: ListMeta::new(&spec, total) })
    }

    pub async fn get(&self, id: i64) -> Result<Alumnus, ApiError> {
        with_timeout(config().database.query_timeout_secs, self.store.get_alumnus(id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch alumnus", e))?
            .ok_or_else(|| ApiError::not_found(format!("Alumnus {} not found", id)))
    }

    pub async fn create(&self, req: CreateAlumnusRequest) -> Result<Alumnus, ApiError> {
        let mut errors = FieldErrors::default();
        let student_number = errors.required("student_number", req.student_number.as_deref());
        let name = errors.required("name", req.name.as_deref());
        let major = errors.required("major", req.major.as_deref());
        let email = errors.required("email", req.email.as_deref());
        let password = errors.required("password", req.password.as_deref());
        let cohort = positive_year(&mut errors, "cohort", req.cohort, true);
        let graduation_year = positive_year(&mut errors, "graduation_year", req.graduation_year, true);
        if !email.is_empty() && !is_valid_email(&email) {
            errors.add("email", "Invalid email format");
        }
        if req.role_id.is_none() {
            errors.add("role_id", "This field is required");
        }
        errors.finish()?;

        let role_id = req.role_id.unwrap_or_default();
        self.ensure_role_exists(role_id).await?;

        let alumnus = NewAlumnus {
            student_number,
            name,
            major,
            cohort: cohort.unwrap_or_default(),
            graduation_year: graduation_year.unwrap_or_default(),
            email,
            phone: optional_text(req.phone),
            address: optional_text(req.address),
            password_hash: hash_password(&password)?,
            role_id,
        };
        let created = with_timeout(config().database.query_timeout_secs, self.store.create_alumnus(alumnus))
            .await
            .map_err(|e| ApiError::storage("Failed to create alumnus", e))?;
        info!("Created alumnus {} ({})", created.id, created.student_number);
        Ok(created)
    }

    pub async fn update(&self, id: i64, req: UpdateAlumnusRequest) -> Result<Alumnus, ApiError> {
        let mut errors = FieldErrors::default();
        let mut present = |field: &str, value: Option<String>| match value.map(|v| v.trim().to_string()) {
            Some(v) if v.is_empty() => {
                errors.add(field, "Must not be empty");
                None
            }
            other => other,
        };
        let student_number = present("student_number", req.student_number);
        let name = present("name", req.name);
        let major = present("major", req.major);
        let email = present("email", req.email);
        let password = present("password", req.password);
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.add("email", "Invalid email format");
        }
        let cohort = positive_year(&mut errors, "cohort", req.cohort, false);
        let graduation_year = positive_year(&mut errors, "graduation_year", req.graduation_year, false);
        errors.finish()?;

        self.get(id).await?;
        if let Some(role_id) = req.role_id {
            self.ensure_role_exists(role_id).await?;
        }

        let changes = AlumnusChanges {
            student_number,
            name,
            major,
            cohort,
            graduation_year,
            email,
            phone: req.phone.map(optional_text),
            address: req.address.map(optional_text),
            password_hash: password.map(|p| hash_password(&p)).transpose()?,
            role_id: req.role_id,
        };
        let updated = with_timeout(config().database.query_timeout_secs, self.store.update_alumnus(id, changes))
            .await
            .map_err(|e| ApiError::storage("Failed to update alumnus", e))?
            .ok_or_else(|| ApiError::not_found(format!("Alumnus {} not found", id)))?;
        info!("Updated alumnus {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let deleted = with_timeout(config().database.query_timeout_secs, self.store.delete_alumnus(id))
            .await
            .map_err(|e| ApiError::storage("Failed to delete alumnus", e))?;
        if !deleted {
            return Err(ApiError::not_found(format!("Alumnus {} not found", id)));
        }
        info!("Deleted alumnus {} and its employment records", id);
        Ok(())
    }

    /// Student-number lookup for holders of the shared API key.
    pub async fn check(&self, params: &CheckAlumnusParams) -> Result<AlumnusCheck, ApiError> {
        let expected = config().security.api_key.as_str();
        if expected.is_empty() || params.key.as_deref() != Some(expected) {
            return Err(ApiError::unauthorized("Invalid key"));
        }
        let mut errors = FieldErrors::default();
        let student_number = errors.required("nim", params.nim.as_deref());
        errors.finish()?;

        let mut filter = Filter::new(Entity::Alumni.table())?;
        filter.assign(FilterData {
            where_clause: Some(json!({ "student_number": student_number })),
            order: None,
            limit: Some(1),
            offset: None,
        })?;
        let (mut found, _) = with_timeout(config().database.query_timeout_secs, self.store.find_alumni(&filter))
            .await
            .map_err(|e| ApiError::storage("Failed to check alumnus", e))?;
        let alumni = found.pop();
        Ok(AlumnusCheck { is_alumni: alumni.is_some(), alumni })
    }

    /// Latest-job snapshot per alumnus. `query` carries its own threshold,
    /// derived from the injected clock by [`Self::status_query`].
    pub async fn employment_status(
        &self,
        query: &EmploymentStatusQuery,
    ) -> Result<(Vec<EmploymentStatusView>, StatusPagination), ApiError> {
        let (views, total) =
            with_timeout(config().database.aggregate_timeout_secs, self.store.employment_status(query))
                .await
                .map_err(|e| ApiError::storage("Failed to fetch employment status", e))?;
        Ok((views, StatusPagination::new(query, total)))
    }

    pub fn status_query(
        &self,
        params: &std::collections::HashMap<String, String>,
        default_limit: i64,
    ) -> EmploymentStatusQuery {
        EmploymentStatusQuery::from_params(params, default_limit, self.clock.now())
    }

    async fn ensure_role_exists(&self, role_id: i64) -> Result<(), ApiError> {
        with_timeout(config().database.query_timeout_secs, self.store.get_role(role_id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch role", e))?
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("Role {} not found", role_id)))
    }
}

fn positive_year(errors: &mut FieldErrors, field: &str, value: Option<i32>, required: bool) -> Option<i32> {
    match value {
        Some(v) if v > 0 => Some(v),
        Some(_) => {
            errors.add(field, "Must be greater than 0");
            None
        }
        None if required => {
            errors.add(field, "This field is required");
            None
        }
        None => None,
    }
}
