use std::marker::PhantomData;

use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Table;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Read access to one table through the filter compiler
pub struct Repository<'p, T> {
    pool: &'p PgPool,
    max_limit: Option<i64>,
    _phantom: PhantomData<T>,
}

impl<'p, T> Repository<'p, T>
where
    T: Table + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: &'p PgPool) -> Self {
        Self {
            pool,
            max_limit: None,
            _phantom: PhantomData,
        }
    }

    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new()?
            .max_limit(self.max_limit)
            .filter(filter_data)?
            .select_all(self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let filter_data = FilterData {
            limit: Some(1),
            ..filter_data
        };
        QueryBuilder::<T>::new()?
            .filter(filter_data)?
            .select_optional(self.pool)
            .await
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        self.select_one(FilterData {
            where_clause: Some(json!({ "id": id.to_string() })),
            ..Default::default()
        })
        .await
    }
}
