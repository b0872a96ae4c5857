use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{optional_text, with_timeout, FieldErrors};
use crate::app::AppState;
use crate::auth::Capability;
use crate::clock::Clock;
use crate::config::config;
use crate::database::models::{EmploymentInput, EmploymentRecord, EmploymentStatus};
use crate::database::Store;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, FilterWhereOptions, SortDirection};
use crate::middleware::AuthUser;
use crate::query::list::{page_offset, total_pages};
use crate::query::{Entity, ListMeta, ListQuery, ListSpec, Paginated};

#[derive(Debug, Default, Deserialize)]
pub struct EmploymentRequest {
    pub alumni_id: Option<i64>,
    #[serde(alias = "nama_perusahaan")]
    pub company: Option<String>,
    #[serde(alias = "posisi_jabatan")]
    pub position: Option<String>,
    #[serde(alias = "bidang_industri")]
    pub industry: Option<String>,
    #[serde(alias = "lokasi_kerja")]
    pub location: Option<String>,
    #[serde(alias = "gaji_range")]
    pub salary_range: Option<String>,
    #[serde(alias = "tanggal_mulai_kerja")]
    pub start_date: Option<String>,
    #[serde(alias = "tanggal_selesai_kerja")]
    pub end_date: Option<String>,
    #[serde(alias = "status_pekerjaan")]
    pub status: Option<String>,
    #[serde(alias = "deskripsi_pekerjaan")]
    pub description: Option<String>,
}

impl EmploymentRequest {
    fn validate(self) -> Result<EmploymentInput, ApiError> {
        let mut errors = FieldErrors::default();
        if self.alumni_id.is_none() {
            errors.add("alumni_id", "This field is required");
        }
        let company = errors.required("company", self.company.as_deref());
        let position = errors.required("position", self.position.as_deref());
        let industry = errors.required("industry", self.industry.as_deref());
        let location = errors.required("location", self.location.as_deref());
        let start_date = parse_date(&mut errors, "start_date", self.start_date.as_deref(), true);
        let end_date = parse_date(&mut errors, "end_date", self.end_date.as_deref(), false);
        let status_raw = errors.required("status", self.status.as_deref());
        let status = EmploymentStatus::parse(&status_raw);
        if !status_raw.is_empty() && status.is_none() {
            errors.add("status", "Must be one of: active, completed, resigned");
        }
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                errors.add("end_date", "Must not be before start_date");
            }
        }
        errors.finish()?;

        match (self.alumni_id, start_date, status) {
            (Some(alumni_id), Some(start_date), Some(status)) => Ok(EmploymentInput {
                alumni_id,
                company,
                position,
                industry,
                location,
                salary_range: optional_text(self.salary_range),
                start_date,
                end_date,
                status,
                description: optional_text(self.description),
            }),
            _ => Err(ApiError::validation_error("Validation failed", None)),
        }
    }
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: Option<&str>, required: bool) -> Option<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(field, "Invalid date format, expected YYYY-MM-DD");
                None
            }
        },
        None => {
            if required {
                errors.add(field, "This field is required");
            }
            None
        }
    }
}

pub struct EmploymentService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl EmploymentService {
    pub fn new(state: &AppState) -> Self {
        Self { store: state.store.clone(), clock: state.clock.clone() }
    }

    fn timeout() -> u64 {
        config().database.query_timeout_secs
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Paginated<EmploymentRecord>, ApiError> {
        let spec = ListSpec::build(Entity::Employment, query);
        let filter = spec.filter()?;
        let (items, total) = with_timeout(Self::timeout(), self.store.find_employment(&filter))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch employment records", e))?;
        Ok(Paginated { items, meta: ListMeta::new(&spec, total) })
    }

    /// Live (not soft-deleted) record.
    pub async fn get(&self, id: i64) -> Result<EmploymentRecord, ApiError> {
        self.find_any(id).await?.filter(|r| !r.is_deleted()).ok_or_else(|| Self::missing(id))
    }

    pub async fn by_alumnus(&self, alumni_id: i64) -> Result<Vec<EmploymentRecord>, ApiError> {
        self.ensure_alumnus_exists(alumni_id).await?;
        let mut filter =
            Filter::new(Entity::Employment.table())?.with_options(FilterWhereOptions::soft_delete("deleted_at"));
        filter.assign(FilterData {
            where_clause: Some(json!({ "alumni_id": alumni_id })),
            order: Some(json!("start_date desc, id desc")),
            limit: None,
            offset: None,
        })?;
        let (items, _) = with_timeout(Self::timeout(), self.store.find_employment(&filter))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch employment records", e))?;
        Ok(items)
    }

    pub async fn create(&self, req: EmploymentRequest) -> Result<EmploymentRecord, ApiError> {
        let input = req.validate()?;
        self.ensure_alumnus_exists(input.alumni_id).await?;
        let record = with_timeout(Self::timeout(), self.store.create_employment(input))
            .await
            .map_err(|e| ApiError::storage("Failed to create employment record", e))?;
        info!("Created employment record {} for alumnus {}", record.id, record.alumni_id);
        Ok(record)
    }

    pub async fn update(&self, id: i64, req: EmploymentRequest) -> Result<EmploymentRecord, ApiError> {
        let input = req.validate()?;
        self.get(id).await?;
        self.ensure_alumnus_exists(input.alumni_id).await?;
        let record = with_timeout(Self::timeout(), self.store.update_employment(id, input))
            .await
            .map_err(|e| ApiError::storage("Failed to update employment record", e))?
            .ok_or_else(|| Self::missing(id))?;
        info!("Updated employment record {}", id);
        Ok(record)
    }

    /// Permanent removal of a live record.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.get(id).await?;
        self.remove(id).await
    }

    pub async fn soft_delete(&self, user: &AuthUser, id: i64) -> Result<EmploymentRecord, ApiError> {
        let record = self.find_any(id).await?.ok_or_else(|| Self::missing(id))?;
        user.require_owner_or_admin(record.alumni_id)?;
        if record.is_deleted() {
            return Err(ApiError::bad_request("Employment record is already deleted"));
        }
        let updated = self.set_deleted_at(id, Some(self.clock.now())).await?;
        info!("Soft-deleted employment record {} (by user {})", id, user.user_id);
        Ok(updated)
    }

    pub async fn restore(&self, user: &AuthUser, id: i64) -> Result<EmploymentRecord, ApiError> {
        let record = self.find_any(id).await?.ok_or_else(|| Self::missing(id))?;
        user.require_owner_or_admin(record.alumni_id)?;
        if !record.is_deleted() {
            return Err(ApiError::bad_request("Employment record is not deleted"));
        }
        let updated = self.set_deleted_at(id, None).await?;
        info!("Restored employment record {} (by user {})", id, user.user_id);
        Ok(updated)
    }

    /// Permanent removal of a record that is already in the trash.
    pub async fn hard_delete(&self, user: &AuthUser, id: i64) -> Result<(), ApiError> {
        let record = self.find_any(id).await?.ok_or_else(|| Self::missing(id))?;
        user.require_owner_or_admin(record.alumni_id)?;
        if !record.is_deleted() {
            return Err(ApiError::bad_request("Employment record must be soft-deleted before permanent deletion"));
        }
        self.remove(id).await
    }

    /// Soft-deleted records, most recently deleted first. Users only see
    /// their own records.
    pub async fn trash(&self, user: &AuthUser, page: i64, limit: i64) -> Result<Paginated<EmploymentRecord>, ApiError> {
        let (page, limit) = (page.max(1), limit.max(1));
        let where_clause = if user.role.can(Capability::ViewAllTrash) {
            json!({ "deleted_at": { "$null": false } })
        } else {
            json!({ "deleted_at": { "$null": false }, "alumni_id": user.user_id })
        };
        let mut filter = Filter::new(Entity::Employment.table())?;
        filter.assign(FilterData {
            where_clause: Some(where_clause),
            order: Some(json!("deleted_at desc, id desc")),
            limit: Some(limit),
            offset: Some(page_offset(page, limit)),
        })?;

        let (items, total) = with_timeout(Self::timeout(), self.store.find_employment(&filter))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch deleted employment records", e))?;
        let meta = ListMeta {
            page,
            limit,
            total,
            pages: total_pages(total, limit),
            sort_by: "deleted_at".to_string(),
            order: SortDirection::Desc,
            search: String::new(),
        };
        Ok(Paginated { items, meta })
    }

    async fn find_any(&self, id: i64) -> Result<Option<EmploymentRecord>, ApiError> {
        with_timeout(Self::timeout(), self.store.get_employment(id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch employment record", e))
    }

    async fn set_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<EmploymentRecord, ApiError> {
        with_timeout(Self::timeout(), self.store.set_employment_deleted_at(id, deleted_at))
            .await
            .map_err(|e| ApiError::storage("Failed to update employment record", e))?
            .ok_or_else(|| Self::missing(id))
    }

    async fn remove(&self, id: i64) -> Result<(), ApiError> {
        let removed = with_timeout(Self::timeout(), self.store.delete_employment(id))
            .await
            .map_err(|e| ApiError::storage("Failed to delete employment record", e))?;
        if !removed {
            return Err(Self::missing(id));
        }
        info!("Permanently deleted employment record {}", id);
        Ok(())
    }

    async fn ensure_alumnus_exists(&self, alumni_id: i64) -> Result<(), ApiError> {
        with_timeout(Self::timeout(), self.store.get_alumnus(alumni_id))
            .await
            .map_err(|e| ApiError::storage("Failed to fetch alumnus", e))?
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("Alumnus {} not found", alumni_id)))
    }

    fn missing(id: i64) -> ApiError {
        ApiError::not_found(format!("Employment record {} not found", id))
    }
}
