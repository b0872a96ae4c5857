use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alumnus {
    pub id: i64,
    pub student_number: String,
    pub name: String,
    pub major: String,
    pub cohort: i32,
    pub graduation_year: i32,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated insert payload; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAlumnus {
    pub student_number: String,
    pub name: String,
    pub major: String,
    pub cohort: i32,
    pub graduation_year: i32,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
    pub role_id: i64,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AlumnusChanges {
    pub student_number: Option<String>,
    pub name: Option<String>,
    pub major: Option<String>,
    pub cohort: Option<i32>,
    pub graduation_year: Option<i32>,
    pub email: Option<String>,
    /// `Some(None)` clears the column.
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub role_id: Option<i64>,
}

impl AlumnusChanges {
    pub fn apply_to(self, alumnus: &mut Alumnus) {
        if let Some(v) = self.student_number { alumnus.student_number = v; }
        if let Some(v) = self.name { alumnus.name = v; }
        if let Some(v) = self.major { alumnus.major = v; }
        if let Some(v) = self.cohort { alumnus.cohort = v; }
        if let Some(v) = self.graduation_year { alumnus.graduation_year = v; }
        if let Some(v) = self.email { alumnus.email = v; }
        if let Some(v) = self.phone { alumnus.phone = v; }
        if let Some(v) = self.address { alumnus.address = v; }
        if let Some(v) = self.password_hash { alumnus.password_hash = v; }
        if let Some(v) = self.role_id { alumnus.role_id = v; }
    }
}
