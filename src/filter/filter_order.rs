use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_match::compare_for_sort;
use super::filter_where::validate_column;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"col dir, col dir"`, an array of such strings, or an object
    /// of `{ col: dir }`. Column names are validated here so nothing
    /// unchecked ever reaches the ORDER BY clause.
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)),
                        other => {
                            return Err(FilterError::InvalidColumn(format!("Order entries must be strings, got {}", other)))
                        }
                    }
                }
                out
            }
            Value::Object(obj) => obj
                .iter()
                .map(|(column, dir)| FilterOrderInfo {
                    column: column.clone(),
                    sort: SortDirection::parse_lenient(dir.as_str().unwrap_or("asc")),
                })
                .collect(),
            other => return Err(FilterError::InvalidColumn(format!("Unsupported order value: {}", other))),
        };

        for info in &infos {
            validate_column(&info.column)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                let sort = SortDirection::parse_lenient(it.next().unwrap_or("asc"));
                Some(FilterOrderInfo { column: column.to_string(), sort })
            })
            .collect()
    }

    /// `byte_ordered` columns are compared with `COLLATE "C"`.
    pub fn generate(infos: &[FilterOrderInfo], byte_ordered: &[&str]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| {
                let collate = if byte_ordered.contains(&i.column.as_str()) { " COLLATE \"C\"" } else { "" };
                format!("\"{}\"{} {}", i.column, collate, i.sort.to_sql())
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// In-memory equivalent of `generate`, applied to JSON documents.
    pub fn compare(a: &Map<String, Value>, b: &Map<String, Value>, infos: &[FilterOrderInfo]) -> Ordering {
        for info in infos {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            match compare_for_sort(left, right, info.sort) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}
