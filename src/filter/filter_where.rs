use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereOptions};

/// Parsed form of a `where` document. Both backends walk this tree, so a
/// clause means the same thing whether it becomes SQL or is evaluated
/// against a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Field { column: String, op: FilterOp, data: Value },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Parse a `where` document. `null` yields an empty conjunction.
    pub fn parse(where_data: &Value) -> Result<Self, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::And(vec![])),
            Value::Object(obj) => {
                let mut parts = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        parts.push(Self::parse_logical(key, value)?);
                    } else {
                        parts.extend(Self::parse_field(key, value)?);
                    }
                }
                Ok(if parts.len() == 1 { parts.remove(0) } else { Condition::And(parts) })
            }
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_logical(op: &str, value: &Value) -> Result<Self, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let children = arr.iter().map(Self::parse).collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::And(children) } else { Condition::Or(children) })
            }
            "$not" => Ok(Condition::Not(Box::new(Self::parse(value)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field(field: &str, value: &Value) -> Result<Vec<Self>, FilterError> {
        validate_column(field)?;
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(Condition::Field {
                        column: field.to_string(),
                        op: FilterOp::parse(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![Condition::Field { column: field.to_string(), op: FilterOp::Eq, data: value.clone() }]),
        }
    }
}

pub(crate) fn validate_column(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", name)));
    }
    Ok(())
}

/// Compiles a `Condition` tree into a parameterised PostgreSQL predicate.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self { param_values: vec![], param_index: starting_param_index }
    }

    /// Returns the predicate and the values for placeholders
    /// `$starting_param_index+1 ..`.
    pub fn generate(
        where_data: Option<&Value>,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let condition = match where_data {
            Some(data) => Condition::parse(data)?,
            None => Condition::And(vec![]),
        };

        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = vec![];
        if let Some(column) = options.live_column() {
            sql_conditions.push(format!("\"{}\" IS NULL", column));
        }
        match &condition {
            Condition::And(children) if children.is_empty() => {}
            other => sql_conditions.push(filter_where.build(other)?),
        }

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    fn build(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::And(children) => self.build_group(children, " AND ", "1=1"),
            Condition::Or(children) => self.build_group(children, " OR ", "1=0"),
            Condition::Not(inner) => Ok(format!("NOT ({})", self.build(inner)?)),
            Condition::Field { column, op, data } => self.build_field(column, *op, data),
        }
    }

    fn build_group(&mut self, children: &[Condition], joiner: &str, empty: &str) -> Result<String, FilterError> {
        if children.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = children.iter().map(|c| self.build(c)).collect::<Result<Vec<_>, _>>()?;
        Ok(format!("({})", parts.join(joiner)))
    }

    fn build_field(&mut self, column: &str, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", column);
        match op {
            FilterOp::Eq => {
                if data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else { Ok(format!("{} = {}", quoted_column, self.param(data))) }
            }
            FilterOp::Ne => {
                if data.is_null() { Ok(format!("{} IS NOT NULL", quoted_column)) }
                else { Ok(format!("{} <> {}", quoted_column, self.param(data))) }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(data))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(data))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data))),
            FilterOp::Like | FilterOp::ILike => {
                if !data.is_string() {
                    return Err(FilterError::InvalidOperatorData("pattern operators require a string".to_string()));
                }
                let keyword = if op == FilterOp::Like { "LIKE" } else { "ILIKE" };
                Ok(format!("{} {} {}", quoted_column, keyword, self.param(data)))
            }
            FilterOp::In => match data {
                Value::Array(values) if values.is_empty() => Ok("1=0".to_string()),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v)).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                }
                other => Ok(format!("{} = {}", quoted_column, self.param(other))),
            },
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => Ok(format!(
                    "{} BETWEEN {} AND {}",
                    quoted_column,
                    self.param(&values[0]),
                    self.param(&values[1])
                )),
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", quoted_column)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", quoted_column)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        }
    }

    fn param(&mut self, value: &Value) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
