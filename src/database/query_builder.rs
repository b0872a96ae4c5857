use serde_json::Value;
use sqlx::{postgres::PgArguments, FromRow, PgConnection, PgPool, Row};

use super::store::StoreError;
use crate::filter::{Filter, SqlResult};

/// Runs a compiled [`Filter`] against PostgreSQL, decoding rows as `T`.
pub struct QueryBuilder<'f, T> {
    filter: &'f Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<'f, T> QueryBuilder<'f, T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(filter: &'f Filter) -> Self {
        Self { filter, _phantom: std::marker::PhantomData }
    }

    pub async fn select_all(&self, conn: &mut PgConnection) -> Result<Vec<T>, StoreError> {
        let sql_result = self.filter.to_sql()?;
        tracing::debug!(query = %sql_result.query, "select");
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(conn).await?)
    }

    pub async fn count(&self, conn: &mut PgConnection) -> Result<i64, StoreError> {
        let sql_result: SqlResult = self.filter.to_count_sql()?;
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(conn).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    /// Page of rows plus the unpaged match count, both read from one
    /// snapshot so `total` always describes the returned page.
    pub async fn select_page(&self, pool: &PgPool) -> Result<(Vec<T>, i64), StoreError> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY").execute(&mut *tx).await?;
        let rows = self.select_all(&mut *tx).await?;
        let total = self.count(&mut *tx).await?;
        tx.commit().await?;
        Ok((rows, total))
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => q.bind(i),
            (None, Some(f)) => q.bind(f),
            (None, None) => q.bind(n.to_string()),
        },
        Value::String(s) => q.bind(s),
        // `$in` and `$between` are expanded to scalars before binding
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => q.bind(i),
            (None, Some(f)) => q.bind(f),
            (None, None) => q.bind(n.to_string()),
        },
        Value::String(s) => q.bind(s),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
