use std::marker::PhantomData;

use serde_json::Value;
use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::Table;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData};

/// Compiles `FilterData` for table `T` and runs it through sqlx.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: Table + for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new() -> Result<Self, DatabaseError> {
        let filter = Filter::new(T::NAME)?.with_options(T::where_options());
        Ok(Self {
            filter,
            _phantom: PhantomData,
        })
    }

    pub fn max_limit(mut self, max_limit: Option<i64>) -> Self {
        self.filter = self.filter.with_max_limit(max_limit);
        self
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter.assign(filter_data)?;
        Ok(self)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn select_optional(self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql_result = self.sql_result()?;
        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    fn sql_result(&self) -> Result<SqlResult, DatabaseError> {
        Ok(self.filter.to_sql()?)
    }
}

// Placeholders carry their own casts, so scalars go over the wire as text.
fn bind_param<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => q.bind(None::<String>),
        Value::String(s) => q.bind(s.as_str()),
        other => q.bind(other.to_string()),
    }
}
