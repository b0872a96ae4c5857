use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::manager::DatabaseManager;
use super::models::{Alumnus, AlumnusChanges, EmploymentInput, EmploymentRecord, NewAlumnus, Role};
use super::query_builder::QueryBuilder;
use super::store::{Store, StoreError};
use crate::filter::Filter;
use crate::query::{EmploymentStatusQuery, EmploymentStatusView};

const EMPLOYMENT_COLUMNS: &str = "id, alumni_id, company, position, industry, location, salary_range, \
    start_date, end_date, status, description, created_at, updated_at, deleted_at";

/// Relational backend.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_alumni(&self, filter: &Filter) -> Result<(Vec<Alumnus>, i64), StoreError> {
        QueryBuilder::<Alumnus>::new(filter).select_page(&self.pool).await
    }

    async fn get_alumnus(&self, id: i64) -> Result<Option<Alumnus>, StoreError> {
        let row = sqlx::query_as::<_, Alumnus>("SELECT * FROM alumni WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_alumnus_by_email(&self, email: &str) -> Result<Option<Alumnus>, StoreError> {
        let row = sqlx::query_as::<_, Alumnus>("SELECT * FROM alumni WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_alumnus(&self, alumnus: NewAlumnus) -> Result<Alumnus, StoreError> {
        let row = sqlx::query_as::<_, Alumnus>(
            "INSERT INTO alumni (student_number, name, major, cohort, graduation_year, email, phone, address, \
             password_hash, role_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(&alumnus.student_number)
        .bind(&alumnus.name)
        .bind(&alumnus.major)
        .bind(alumnus.cohort)
        .bind(alumnus.graduation_year)
        .bind(&alumnus.email)
        .bind(&alumnus.phone)
        .bind(&alumnus.address)
        .bind(&alumnus.password_hash)
        .bind(alumnus.role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_alumnus(&self, id: i64, changes: AlumnusChanges) -> Result<Option<Alumnus>, StoreError> {
        let row = sqlx::query_as::<_, Alumnus>(
            "UPDATE alumni SET \
                student_number = COALESCE($2, student_number), \
                name = COALESCE($3, name), \
                major = COALESCE($4, major), \
                cohort = COALESCE($5, cohort), \
                graduation_year = COALESCE($6, graduation_year), \
                email = COALESCE($7, email), \
                phone = CASE WHEN $12 THEN $8 ELSE phone END, \
                address = CASE WHEN $13 THEN $9 ELSE address END, \
                password_hash = COALESCE($10, password_hash), \
                role_id = COALESCE($11, role_id), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.student_number)
        .bind(changes.name)
        .bind(changes.major)
        .bind(changes.cohort)
        .bind(changes.graduation_year)
        .bind(changes.email)
        .bind(changes.phone.clone().flatten())
        .bind(changes.address.clone().flatten())
        .bind(changes.password_hash)
        .bind(changes.role_id)
        .bind(changes.phone.is_some())
        .bind(changes.address.is_some())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_alumnus(&self, id: i64) -> Result<bool, StoreError> {
        // employment rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM alumni WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_employment(&self, filter: &Filter) -> Result<(Vec<EmploymentRecord>, i64), StoreError> {
        QueryBuilder::<EmploymentRecord>::new(filter).select_page(&self.pool).await
    }

    async fn get_employment(&self, id: i64) -> Result<Option<EmploymentRecord>, StoreError> {
        let row = sqlx::query_as::<_, EmploymentRecord>(&format!(
            "SELECT {} FROM employment WHERE id = $1",
            EMPLOYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_employment(&self, input: EmploymentInput) -> Result<EmploymentRecord, StoreError> {
        let row = sqlx::query_as::<_, EmploymentRecord>(&format!(
            "INSERT INTO employment (alumni_id, company, position, industry, location, salary_range, \
             start_date, end_date, status, description) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            EMPLOYMENT_COLUMNS
        ))
        .bind(input.alumni_id)
        .bind(&input.company)
        .bind(&input.position)
        .bind(&input.industry)
        .bind(&input.location)
        .bind(&input.salary_range)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.status.as_str())
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_employment(&self, id: i64, input: EmploymentInput) -> Result<Option<EmploymentRecord>, StoreError> {
        let row = sqlx::query_as::<_, EmploymentRecord>(&format!(
            "UPDATE employment SET alumni_id = $2, company = $3, position = $4, industry = $5, location = $6, \
             salary_range = $7, start_date = $8, end_date = $9, status = $10, description = $11, \
             updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            EMPLOYMENT_COLUMNS
        ))
        .bind(id)
        .bind(input.alumni_id)
        .bind(&input.company)
        .bind(&input.position)
        .bind(&input.industry)
        .bind(&input.location)
        .bind(&input.salary_range)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.status.as_str())
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_employment_deleted_at(
        &self,
        id: i64,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Result<Option<EmploymentRecord>, StoreError> {
        let row = sqlx::query_as::<_, EmploymentRecord>(&format!(
            "UPDATE employment SET deleted_at = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            EMPLOYMENT_COLUMNS
        ))
        .bind(id)
        .bind(deleted_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_employment(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employment WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn employment_status(
        &self,
        query: &EmploymentStatusQuery,
    ) -> Result<(Vec<EmploymentStatusView>, i64), StoreError> {
        let filter = query.filter()?;
        QueryBuilder::<EmploymentStatusView>::new(&filter).select_page(&self.pool).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id").fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_role(&self, name: &str) -> Result<Role, StoreError> {
        let row = sqlx::query_as::<_, Role>("INSERT INTO roles (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, Role>("UPDATE roles SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_role(&self, id: i64) -> Result<bool, StoreError> {
        // ON DELETE RESTRICT turns a referenced role into a 23503, mapped to Conflict
        let result = sqlx::query("DELETE FROM roles WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
