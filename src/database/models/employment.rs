use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentStatus {
    Active,
    Completed,
    Resigned,
}

impl EmploymentStatus {
    /// Accepts the canonical names and the legacy `aktif` / `selesai` labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" | "aktif" => Some(Self::Active),
            "completed" | "selesai" => Some(Self::Completed),
            "resigned" => Some(Self::Resigned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Resigned => "resigned",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for EmploymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown employment status: {}", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmploymentRecord {
    pub id: i64,
    pub alumni_id: i64,
    pub company: String,
    pub position: String,
    pub industry: String,
    pub location: String,
    pub salary_range: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: EmploymentStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EmploymentRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Validated values for creating or fully replacing a record.
#[derive(Debug, Clone)]
pub struct EmploymentInput {
    pub alumni_id: i64,
    pub company: String,
    pub position: String,
    pub industry: String,
    pub location: String,
    pub salary_range: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: EmploymentStatus,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_labels_are_accepted() {
        assert_eq!(EmploymentStatus::parse("aktif"), Some(EmploymentStatus::Active));
        assert_eq!(EmploymentStatus::parse("Selesai"), Some(EmploymentStatus::Completed));
        assert_eq!(EmploymentStatus::parse("resigned"), Some(EmploymentStatus::Resigned));
        assert_eq!(EmploymentStatus::parse("fired"), None);
        assert!(EmploymentStatus::try_from("unknown".to_string()).is_err());
    }
}
