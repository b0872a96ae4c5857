// filter/filter_match.rs - evaluate a `where` document against JSON documents
//
// This is the document-store counterpart of `FilterWhere`. Evaluation is
// three-valued like SQL: a comparison against a missing or null field is
// "unknown", and only documents whose predicate is definitely true match.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::filter_where::Condition;
use super::types::{FilterOp, FilterWhereOptions, SortDirection};

pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(condition: &Condition, doc: &Map<String, Value>, options: &FilterWhereOptions) -> bool {
        if let Some(column) = options.live_column() {
            if !doc.get(column).map_or(true, Value::is_null) {
                return false;
            }
        }
        Self::eval(condition, doc) == Some(true)
    }

    fn eval(condition: &Condition, doc: &Map<String, Value>) -> Option<bool> {
        match condition {
            Condition::And(children) => {
                let mut result = Some(true);
                for child in children {
                    match Self::eval(child, doc) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            Condition::Or(children) => {
                let mut result = Some(false);
                for child in children {
                    match Self::eval(child, doc) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            Condition::Not(inner) => Self::eval(inner, doc).map(|b| !b),
            Condition::Field { column, op, data } => {
                let field = doc.get(column).unwrap_or(&Value::Null);
                Self::eval_field(field, *op, data)
            }
        }
    }

    fn eval_field(field: &Value, op: FilterOp, data: &Value) -> Option<bool> {
        match op {
            FilterOp::Eq if data.is_null() => Some(field.is_null()),
            FilterOp::Ne if data.is_null() => Some(!field.is_null()),
            FilterOp::Null => Some(field.is_null() == data.as_bool().unwrap_or(true)),
            _ if field.is_null() => None,
            FilterOp::Eq => Some(compare_values(field, data) == Some(Ordering::Equal)),
            FilterOp::Ne => Some(compare_values(field, data) != Some(Ordering::Equal)),
            FilterOp::Gt => compare_values(field, data).map(|o| o == Ordering::Greater),
            FilterOp::Gte => compare_values(field, data).map(|o| o != Ordering::Less),
            FilterOp::Lt => compare_values(field, data).map(|o| o == Ordering::Less),
            FilterOp::Lte => compare_values(field, data).map(|o| o != Ordering::Greater),
            FilterOp::Like | FilterOp::ILike => {
                let text = field.as_str()?;
                let pattern = data.as_str()?;
                Some(like_match(pattern, text, op == FilterOp::ILike))
            }
            FilterOp::In => match data {
                Value::Array(values) => {
                    Some(values.iter().any(|v| compare_values(field, v) == Some(Ordering::Equal)))
                }
                other => Some(compare_values(field, other) == Some(Ordering::Equal)),
            },
            FilterOp::Between => match data {
                Value::Array(bounds) if bounds.len() == 2 => {
                    let low = compare_values(field, &bounds[0])?;
                    let high = compare_values(field, &bounds[1])?;
                    Some(low != Ordering::Less && high != Ordering::Greater)
                }
                _ => None,
            },
        }
    }
}

/// Orders two JSON scalars. Strings that both parse as RFC 3339 timestamps
/// or as ISO dates compare chronologically. Mixed types are unordered.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => {
            if let (Ok(x), Ok(y)) = (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                return Some(x.cmp(&y));
            }
            if let (Ok(x), Ok(y)) = (x.parse::<NaiveDate>(), y.parse::<NaiveDate>()) {
                return Some(x.cmp(&y));
            }
            Some(x.cmp(y))
        }
        _ => None,
    }
}

/// Sort comparator with PostgreSQL's default null placement: nulls sort as
/// the largest value, so last when ascending and first when descending.
pub fn compare_for_sort(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    let ordering = match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare_values(a, b).unwrap_or(Ordering::Equal),
    };
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Lit(char),
}

/// SQL LIKE semantics: `%` matches any run, `_` one character, and a
/// backslash makes the next character literal.
pub fn like_match(pattern: &str, text: &str, case_insensitive: bool) -> bool {
    let (pattern, text) = if case_insensitive {
        (pattern.to_lowercase(), text.to_lowercase())
    } else {
        (pattern.to_string(), text.to_string())
    };

    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            other => Token::Lit(other),
        });
    }
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::One) => {
                p += 1;
                t += 1;
            }
            Some(Token::Lit(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            Some(Token::Any) => {
                backtrack = Some((p, t));
                p += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    while tokens.get(p) == Some(&Token::Any) {
        p += 1;
    }
    p == tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn like_handles_wildcards_and_escapes() {
        assert!(like_match("%sayu%", "Sayu Yunan", true));
        assert!(!like_match("%sayu%", "Sayu Yunan", false));
        assert!(like_match("s_yu%", "sayu", false));
        assert!(like_match("%100\\%%", "grew 100% in a year", false));
        assert!(!like_match("%100\\%%", "grew 1000 in a year", false));
        assert!(like_match("%%", "", false));
        assert!(!like_match("_", "", false));
    }

    #[test]
    fn null_fields_never_satisfy_comparisons() {
        let d = doc(json!({ "industry": null, "name": "Ana" }));
        let cond = Condition::parse(&json!({ "industry": { "$ilike": "%tech%" } })).unwrap();
        assert!(!FilterMatch::matches(&cond, &d, &FilterWhereOptions::default()));

        let negated = Condition::parse(&json!({ "$not": { "industry": { "$ilike": "%tech%" } } })).unwrap();
        assert!(!FilterMatch::matches(&negated, &d, &FilterWhereOptions::default()));
    }

    #[test]
    fn or_group_matches_any_branch() {
        let d = doc(json!({ "name": "Sayu Yunan", "email": "s@example.com" }));
        let cond = Condition::parse(&json!({
            "$or": [{ "email": { "$ilike": "%nobody%" } }, { "name": { "$ilike": "%YUNAN%" } }]
        }))
        .unwrap();
        assert!(FilterMatch::matches(&cond, &d, &FilterWhereOptions::default()));
    }

    #[test]
    fn soft_deleted_documents_are_hidden() {
        let d = doc(json!({ "id": 1, "deleted_at": "2024-01-01T00:00:00Z" }));
        let cond = Condition::parse(&Value::Null).unwrap();
        assert!(!FilterMatch::matches(&cond, &d, &FilterWhereOptions::soft_delete("deleted_at")));
        assert!(FilterMatch::matches(&cond, &d, &FilterWhereOptions::default()));
    }

    #[test]
    fn timestamps_compare_chronologically() {
        let a = json!("2024-01-01T00:00:00.5Z");
        let b = json!("2024-01-01T00:00:01Z");
        assert_eq!(compare_values(&a, &b), Some(Ordering::Less));
        assert_eq!(compare_for_sort(&Value::Null, &b, SortDirection::Asc), Ordering::Greater);
        assert_eq!(compare_for_sort(&Value::Null, &b, SortDirection::Desc), Ordering::Less);
    }
}
