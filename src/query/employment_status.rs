//! Per-alumnus employment snapshot: latest job, job count and the
//! "employed more than one year" flag.
//!
//! The relational backend evaluates `STATUS_VIEW_CTE`; the document backend
//! calls [`aggregate`]. Both then run the same `Filter` over the resulting
//! view rows, so filtering, ordering and paging are shared.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::list::{escape_like, page_offset, parse_positive, total_pages};
use crate::database::models::{Alumnus, EmploymentRecord};
use crate::filter::{Filter, FilterData, FilterError};

pub const STATUS_VIEW: &str = "employment_status";

/// Defines `employment_status` with the one-year threshold date bound to `$1`.
/// Latest employment is the live record with the greatest `start_date`, ties
/// going to the highest id.
pub const STATUS_VIEW_CTE: &str = "WITH latest_employment AS ( \
    SELECT DISTINCT ON (alumni_id) alumni_id, industry, company, position, start_date, salary_range \
    FROM employment WHERE deleted_at IS NULL \
    ORDER BY alumni_id, start_date DESC, id DESC \
), employment_counts AS ( \
    SELECT alumni_id, COUNT(*) AS employment_count \
    FROM employment WHERE deleted_at IS NULL GROUP BY alumni_id \
), employment_status AS ( \
    SELECT a.id, a.name, a.major, a.cohort, \
           le.industry, le.company, le.position, le.start_date, le.salary_range, \
           COALESCE(ec.employment_count, 0) AS employment_count, \
           COALESCE(le.start_date <= $1::date, FALSE) AS more_than_one_year \
    FROM alumni a \
    LEFT JOIN latest_employment le ON le.alumni_id = a.id \
    LEFT JOIN employment_counts ec ON ec.alumni_id = a.id \
)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmploymentStatusView {
    pub id: i64,
    pub name: String,
    pub major: String,
    pub cohort: i32,
    pub industry: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub salary_range: Option<String>,
    pub employment_count: i64,
    pub more_than_one_year: bool,
}

/// Start dates on or before this date count as more than one year ago.
pub fn one_year_threshold(now: DateTime<Utc>) -> NaiveDate {
    (now - Duration::days(365)).date_naive()
}

/// Builds one view per alumnus, in input order. Soft-deleted records are
/// ignored for both the latest job and the count.
pub fn aggregate(alumni: &[Alumnus], records: &[EmploymentRecord], threshold: NaiveDate) -> Vec<EmploymentStatusView> {
    let mut per_alumnus: HashMap<i64, (&EmploymentRecord, i64)> = HashMap::new();
    for record in records.iter().filter(|r| !r.is_deleted()) {
        per_alumnus
            .entry(record.alumni_id)
            .and_modify(|(latest, count)| {
                *count += 1;
                if (record.start_date, record.id) > (latest.start_date, latest.id) {
                    *latest = record;
                }
            })
            .or_insert((record, 1));
    }

    alumni
        .iter()
        .map(|alumnus| {
            let (latest, count) = match per_alumnus.get(&alumnus.id) {
                Some((latest, count)) => (Some(*latest), *count),
                None => (None, 0),
            };
            EmploymentStatusView {
                id: alumnus.id,
                name: alumnus.name.clone(),
                major: alumnus.major.clone(),
                cohort: alumnus.cohort,
                industry: latest.map(|r| r.industry.clone()),
                company: latest.map(|r| r.company.clone()),
                position: latest.map(|r| r.position.clone()),
                start_date: latest.map(|r| r.start_date),
                salary_range: latest.and_then(|r| r.salary_range.clone()),
                employment_count: count,
                more_than_one_year: latest.is_some_and(|r| r.start_date <= threshold),
            }
        })
        .collect()
}

/// Optional filters. Each one is absent when its raw value is missing,
/// blank or unparsable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmploymentStatusFilter {
    pub alumni_id: Option<i64>,
    pub name: Option<String>,
    pub major: Option<String>,
    pub cohort: Option<i32>,
    pub industry: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub more_than_one_year: Option<bool>,
}

impl EmploymentStatusFilter {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| params.get(*k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            alumni_id: text(&["id"]).and_then(|v| v.parse().ok()),
            name: text(&["nama", "name"]),
            major: text(&["jurusan", "major"]),
            cohort: text(&["angkatan", "cohort"]).and_then(|v| v.parse().ok()),
            industry: text(&["bidang_industri", "industry"]),
            company: text(&["nama_perusahaan", "company"]),
            position: text(&["posisi_jabatan", "position"]),
            more_than_one_year: text(&["lebih_dari_1_tahun", "more_than_one_year"]).and_then(|v| parse_flag(&v)),
        }
    }

    pub fn where_clause(&self) -> Option<Value> {
        let mut clause = Map::new();
        let contains = |v: &str| json!({ "$ilike": format!("%{}%", escape_like(v)) });

        if let Some(id) = self.alumni_id {
            clause.insert("id".into(), json!(id));
        }
        if let Some(name) = &self.name {
            clause.insert("name".into(), contains(name));
        }
        if let Some(major) = &self.major {
            clause.insert("major".into(), contains(major));
        }
        if let Some(cohort) = self.cohort {
            clause.insert("cohort".into(), json!(cohort));
        }
        if let Some(industry) = &self.industry {
            clause.insert("industry".into(), contains(industry));
        }
        if let Some(company) = &self.company {
            clause.insert("company".into(), contains(company));
        }
        if let Some(position) = &self.position {
            clause.insert("position".into(), contains(position));
        }
        if let Some(flag) = self.more_than_one_year {
            clause.insert("more_than_one_year".into(), json!(flag));
        }

        if clause.is_empty() { None } else { Some(Value::Object(clause)) }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmploymentStatusQuery {
    pub filter: EmploymentStatusFilter,
    pub page: i64,
    pub limit: i64,
    pub threshold: NaiveDate,
}

impl EmploymentStatusQuery {
    pub fn from_params(params: &HashMap<String, String>, default_limit: i64, now: DateTime<Utc>) -> Self {
        Self {
            filter: EmploymentStatusFilter::from_params(params),
            page: parse_positive(params.get("page").map(String::as_str)).unwrap_or(1),
            limit: parse_positive(params.get("limit").map(String::as_str)).unwrap_or(default_limit),
            threshold: one_year_threshold(now),
        }
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit)
    }

    /// Filter over the `employment_status` view. The SQL prelude is ignored
    /// when the filter is applied to in-memory view rows.
    pub fn filter(&self) -> Result<Filter, FilterError> {
        let mut filter = Filter::new(STATUS_VIEW)?
            .with_prelude(STATUS_VIEW_CTE, vec![Value::String(self.threshold.to_string())])
            .with_byte_order(&["name"]);
        filter.assign(FilterData {
            where_clause: self.filter.where_clause(),
            order: Some(json!("name asc, id asc")),
            limit: Some(self.limit),
            offset: Some(self.offset()),
        })?;
        Ok(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total_records: i64,
    pub total_pages: i64,
}

impl StatusPagination {
    pub fn new(query: &EmploymentStatusQuery, total: i64) -> Self {
        Self {
            current_page: query.page,
            per_page: query.limit,
            total_records: total,
            total_pages: total_pages(total, query.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::EmploymentStatus;
    use chrono::TimeZone;

    fn alumnus(id: i64, name: &str) -> Alumnus {
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        Alumnus {
            id,
            student_number: format!("NIM{}", id),
            name: name.into(),
            major: "Informatics".into(),
            cohort: 2018,
            graduation_year: 2022,
            email: format!("a{}@example.com", id),
            phone: None,
            address: None,
            password_hash: String::new(),
            role_id: 2,
            created_at: at,
            updated_at: at,
        }
    }

    fn record(id: i64, alumni_id: i64, start: &str) -> EmploymentRecord {
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        EmploymentRecord {
            id,
            alumni_id,
            company: format!("Company {}", id),
            position: "Engineer".into(),
            industry: "Technology".into(),
            location: "Jakarta".into(),
            salary_range: Some("10-15".into()),
            start_date: start.parse().unwrap(),
            end_date: None,
            status: EmploymentStatus::Active,
            description: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    fn threshold_at(now: &str) -> NaiveDate {
        one_year_threshold(DateTime::parse_from_rfc3339(now).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn latest_record_is_the_max_start_date_and_all_records_count() {
        let records = vec![record(1, 1, "2024-01-01"), record(2, 1, "2024-06-01"), record(3, 1, "2023-01-01")];
        let views = aggregate(&[alumnus(1, "Sayu")], &records, threshold_at("2025-06-01T00:00:00Z"));
        assert_eq!(views[0].start_date, Some("2024-06-01".parse().unwrap()));
        assert_eq!(views[0].company.as_deref(), Some("Company 2"));
        assert_eq!(views[0].employment_count, 3);
    }

    #[test]
    fn one_year_flag_compares_against_now_minus_365_days() {
        let threshold = threshold_at("2025-06-01T00:00:00Z");
        let old = aggregate(&[alumnus(1, "A")], &[record(1, 1, "2023-06-01")], threshold);
        let new = aggregate(&[alumnus(1, "A")], &[record(1, 1, "2025-01-01")], threshold);
        assert!(old[0].more_than_one_year);
        assert!(!new[0].more_than_one_year);
        assert!(aggregate(&[alumnus(1, "A")], &[record(1, 1, "2024-06-01")], threshold)[0].more_than_one_year);
        assert!(!aggregate(&[alumnus(1, "A")], &[record(1, 1, "2024-06-02")], threshold)[0].more_than_one_year);
    }

    #[test]
    fn alumnus_without_employment_has_empty_fields() {
        let views = aggregate(&[alumnus(7, "Nobody")], &[], threshold_at("2025-06-01T00:00:00Z"));
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].employment_count, 0);
        assert!(views[0].company.is_none() && views[0].start_date.is_none());
        assert!(!views[0].more_than_one_year);
    }

    #[test]
    fn ties_go_to_highest_id_and_deleted_records_are_ignored() {
        let mut deleted = record(9, 1, "2026-01-01");
        deleted.deleted_at = Some(Utc::now());
        let records = vec![record(4, 1, "2024-01-01"), record(5, 1, "2024-01-01"), deleted];
        let views = aggregate(&[alumnus(1, "A")], &records, threshold_at("2025-06-01T00:00:00Z"));
        assert_eq!(views[0].company.as_deref(), Some("Company 5"));
        assert_eq!(views[0].employment_count, 2);
    }

    #[test]
    fn malformed_filters_are_dropped() {
        let params: HashMap<String, String> = [
            ("angkatan", "twenty"),
            ("lebih_dari_1_tahun", "maybe"),
            ("id", "x1"),
            ("nama", "  "),
            ("company", "Acme"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let filter = EmploymentStatusFilter::from_params(&params);
        assert_eq!(filter, EmploymentStatusFilter { company: Some("Acme".into()), ..Default::default() });
        assert_eq!(filter.where_clause(), Some(json!({ "company": { "$ilike": "%Acme%" } })));
    }

    #[test]
    fn status_sql_binds_threshold_first() {
        let query = EmploymentStatusQuery {
            filter: EmploymentStatusFilter { more_than_one_year: Some(true), ..Default::default() },
            page: 2,
            limit: 20,
            threshold: "2024-06-01".parse().unwrap(),
        };
        let sql = query.filter().unwrap().to_sql().unwrap();
        assert!(sql.query.ends_with(
            "SELECT * FROM \"employment_status\" WHERE \"more_than_one_year\" = $2 \
             ORDER BY \"name\" COLLATE \"C\" ASC, \"id\" ASC LIMIT 20 OFFSET 20"
        ));
        assert_eq!(sql.params, vec![json!("2024-06-01"), json!(true)]);
    }
}
