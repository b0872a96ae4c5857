//! Translation of list-endpoint parameters into a backend-neutral filter.
//!
//! `ListSpec` owns the business rules (sort whitelist, search field set,
//! tie-break, paging arithmetic). Backends only see the resulting `Filter`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::filter::{Filter, FilterData, FilterError, FilterWhereOptions, SortDirection};

/// Collections that support generic listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Alumni,
    Employment,
}

impl Entity {
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Alumni => "alumni",
            Entity::Employment => "employment",
        }
    }

    pub fn search_fields(&self) -> &'static [&'static str] {
        match self {
            Entity::Alumni => &["name", "email", "major", "student_number"],
            Entity::Employment => &["company", "position", "industry", "location"],
        }
    }

    /// Sortable text columns. Both backends order these by byte value.
    pub fn text_columns(&self) -> &'static [&'static str] {
        match self {
            Entity::Alumni => &["name", "email", "major"],
            Entity::Employment => &["company", "position", "industry", "location", "status"],
        }
    }

    pub fn soft_delete_column(&self) -> Option<&'static str> {
        match self {
            Entity::Alumni => None,
            Entity::Employment => Some("deleted_at"),
        }
    }

    /// Maps a requested sort key onto a whitelisted column. Unknown keys
    /// fall back to `id`.
    pub fn sort_column(&self, requested: &str) -> &'static str {
        let key = requested.trim().to_ascii_lowercase();
        match (self, key.as_str()) {
            (_, "id") => "id",
            (_, "created_at") => "created_at",

            (Entity::Alumni, "name" | "nama") => "name",
            (Entity::Alumni, "email") => "email",
            (Entity::Alumni, "major" | "jurusan") => "major",
            (Entity::Alumni, "cohort" | "angkatan") => "cohort",
            (Entity::Alumni, "graduation_year" | "tahun_lulus") => "graduation_year",

            (Entity::Employment, "company" | "nama_perusahaan") => "company",
            (Entity::Employment, "position" | "posisi_jabatan") => "position",
            (Entity::Employment, "industry" | "bidang_industri") => "industry",
            (Entity::Employment, "location" | "lokasi_kerja") => "location",
            (Entity::Employment, "start_date" | "tanggal_mulai_kerja") => "start_date",
            (Entity::Employment, "status" | "status_pekerjaan") => "status",

            _ => "id",
        }
    }
}

/// Raw query-string parameters. Everything is optional text so that a
/// malformed value degrades to its default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "sortBy", alias = "sort_by")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    pub order: String,
    pub search: String,
}

impl ListQuery {
    pub fn from_params(params: &ListParams, default_limit: i64) -> Self {
        Self {
            page: parse_positive(params.page.as_deref()).unwrap_or(1),
            limit: parse_positive(params.limit.as_deref()).unwrap_or(default_limit),
            sort_by: params.sort_by.clone().unwrap_or_default(),
            order: params.order.clone().unwrap_or_default(),
            search: params.search.as_deref().map(str::trim).unwrap_or_default().to_string(),
        }
    }
}

pub(crate) fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n > 0)
}

/// Resolved listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    pub entity: Entity,
    pub page: i64,
    pub limit: i64,
    pub sort_by: &'static str,
    pub order: SortDirection,
    pub search: String,
}

impl ListSpec {
    pub fn build(entity: Entity, query: &ListQuery) -> Self {
        Self {
            entity,
            page: query.page.max(1),
            limit: query.limit.max(1),
            sort_by: entity.sort_column(&query.sort_by),
            order: SortDirection::parse_lenient(&query.order),
            search: query.search.clone(),
        }
    }

    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit)
    }

    pub fn filter_data(&self) -> FilterData {
        let where_clause = if self.search.is_empty() {
            None
        } else {
            let pattern = format!("%{}%", escape_like(&self.search));
            let branches: Vec<Value> = self
                .entity
                .search_fields()
                .iter()
                .map(|field| json!({ *field: { "$ilike": pattern } }))
                .collect();
            Some(json!({ "$or": branches }))
        };

        let order = if self.sort_by == "id" {
            format!("id {}", self.order.as_str())
        } else {
            format!("{} {}, id asc", self.sort_by, self.order.as_str())
        };

        FilterData {
            where_clause,
            order: Some(Value::String(order)),
            limit: Some(self.limit),
            offset: Some(self.offset()),
        }
    }

    pub fn filter(&self) -> Result<Filter, FilterError> {
        let options = match self.entity.soft_delete_column() {
            Some(column) => FilterWhereOptions::soft_delete(column),
            None => FilterWhereOptions::default(),
        };
        let mut filter =
            Filter::new(self.entity.table())?.with_options(options).with_byte_order(self.entity.text_columns());
        filter.assign(self.filter_data())?;
        Ok(filter)
    }
}

/// Escapes LIKE metacharacters so user text matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Rows to skip before `page`. Saturates instead of overflowing, so an
/// out-of-range page reads past the end and comes back empty.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.max(1).saturating_sub(1).saturating_mul(limit.max(0))
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        0
    } else {
        total / limit + i64::from(total % limit != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
    #[serde(rename = "sortBy")]
    pub sort_by: String,
    pub order: SortDirection,
    pub search: String,
}

impl ListMeta {
    pub fn new(spec: &ListSpec, total: i64) -> Self {
        Self {
            page: spec.page,
            limit: spec.limit,
            total,
            pages: total_pages(total, spec.limit),
            sort_by: spec.sort_by.to_string(),
            order: spec.order,
            search: spec.search.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: ListMeta,
}
