use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_match::FilterMatch;
use super::filter_order::FilterOrder;
use super::filter_where::{validate_column, Condition, FilterWhere};
use super::types::{FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};

/// A filtered, ordered, paged read over one relation.
///
/// The relation is either a table or a named view defined by a `WITH`
/// prelude. Prelude placeholders come first, so the WHERE clause numbers
/// its own placeholders after them.
pub struct Filter {
    table_name: String,
    prelude: Option<(String, Vec<Value>)>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    options: FilterWhereOptions,
    byte_ordered: &'static [&'static str],
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            prelude: None,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            options: FilterWhereOptions::default(),
            byte_ordered: &[],
        })
    }

    /// `cte` must define `table_name` and may use `$1..$n` for `params`.
    pub fn with_prelude(mut self, cte: impl Into<String>, params: Vec<Value>) -> Self {
        self.prelude = Some((cte.into(), params));
        self
    }

    pub fn with_options(mut self, options: FilterWhereOptions) -> Self {
        self.options = options;
        self
    }

    /// Text columns that sort by byte value (`COLLATE "C"`) in SQL, which is
    /// how [`Filter::apply`] orders strings.
    pub fn with_byte_order(mut self, columns: &'static [&'static str]) -> Self {
        self.byte_ordered = columns;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        Condition::parse(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if offset.is_some_and(|o| o < 0) {
            return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_with_prelude_params()?;
        let query = [
            self.prelude_sql(),
            format!("SELECT * FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            FilterOrder::generate(&self.order_data, self.byte_ordered),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_with_prelude_params()?;
        let query = [
            self.prelude_sql(),
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_clause),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        Ok(SqlResult { query, params })
    }

    /// Runs the same filter over in-memory documents. Returns the requested
    /// page and the number of documents that matched before paging.
    pub fn apply(&self, docs: Vec<Map<String, Value>>) -> Result<(Vec<Map<String, Value>>, i64), FilterError> {
        let condition = match &self.where_data {
            Some(data) => Condition::parse(data)?,
            None => Condition::And(vec![]),
        };
        let mut matched: Vec<_> =
            docs.into_iter().filter(|doc| FilterMatch::matches(&condition, doc, &self.options)).collect();
        let total = matched.len() as i64;

        matched.sort_by(|a, b| FilterOrder::compare(a, b, &self.order_data));

        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let page = matched.into_iter().skip(offset);
        let page = match self.limit {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        };
        Ok((page, total))
    }

    fn where_with_prelude_params(&self) -> Result<(String, Vec<Value>), FilterError> {
        let mut params = self.prelude.as_ref().map(|(_, p)| p.clone()).unwrap_or_default();
        let (where_clause, where_params) = FilterWhere::generate(self.where_data.as_ref(), params.len(), &self.options)?;
        params.extend(where_params);
        Ok((where_clause, params))
    }

    fn prelude_sql(&self) -> String {
        self.prelude.as_ref().map(|(sql, _)| sql.clone()).unwrap_or_default()
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        validate_column(name).map_err(|_| FilterError::InvalidTableName(format!("Invalid table name format: {}", name)))
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
