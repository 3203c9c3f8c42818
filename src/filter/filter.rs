use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, FilterWhereOptions, SqlResult};

pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
    max_limit: Option<i64>,
    options: FilterWhereOptions,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", table_name)));
        }
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            max_limit: None,
            options: FilterWhereOptions::default(),
        })
    }

    pub fn with_options(mut self, options: FilterWhereOptions) -> Self {
        self.options = options;
        self
    }

    /// Limits above `max_limit` are capped rather than rejected
    pub fn with_max_limit(mut self, max_limit: Option<i64>) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if data.limit.is_some() || data.offset.is_some() { self.limit(data.limit, data.offset)?; }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if let Some(l) = limit { if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); } }
        if let Some(o) = offset { if o < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        self.limit = match (limit, self.max_limit) {
            (Some(l), Some(max)) if l > max => {
                tracing::warn!("Limit {} exceeds max {}, capping to max", l, max);
                Some(max)
            }
            (l, _) => l,
        };
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = self.where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    fn where_sql(&self) -> Result<(String, Vec<Value>), FilterError> {
        match &self.where_data {
            Some(where_data) => FilterWhere::generate(where_data, 0, &self.options),
            None => Ok(("1=1".to_string(), vec![])),
        }
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

/// Table and column names: ASCII letter or underscore first, then letters, digits, underscores
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnKind;
    use crate::listing::{DateRange, FilterDescriptor, Identifier, Keywords};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn rejects_unsafe_table_names() {
        assert!(Filter::new("blogs").is_ok());
        assert!(Filter::new("_private").is_ok());
        assert!(Filter::new("").is_err());
        assert!(Filter::new("1blogs").is_err());
        assert!(Filter::new("blogs; DROP TABLE users").is_err());
    }

    #[test]
    fn compiles_descriptor_where_with_order_and_page() {
        let owner = Identifier::parse("11111111-1111-4111-8111-111111111111").unwrap();
        let category = Identifier::parse("22222222-2222-4222-8222-222222222222").unwrap();
        let range = DateRange::new(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()), None).unwrap();
        let descriptor = FilterDescriptor::new(owner, category)
            .with_keywords(Keywords::new("rust"))
            .with_date_range(range);

        let mut filter = Filter::new("blogs").unwrap().with_options(FilterWhereOptions::with_columns(&[
            ("user_id", ColumnKind::Uuid),
            ("category_id", ColumnKind::Uuid),
            ("created_at", ColumnKind::Timestamp),
        ]));
        filter
            .assign(FilterData {
                where_clause: Some(descriptor.to_where()),
                order: Some(json!("created_at asc, id asc")),
                limit: Some(5),
                offset: Some(10),
            })
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"blogs\" WHERE ((\"title\" ILIKE $1) OR (\"description\" ILIKE $2)) \
             AND \"category_id\" = $3::uuid AND \"created_at\" >= $4::timestamptz AND \"user_id\" = $5::uuid \
             ORDER BY \"created_at\" ASC, \"id\" ASC LIMIT 5 OFFSET 10"
        );
        assert_eq!(
            sql.params,
            vec![
                json!("%rust%"),
                json!("%rust%"),
                json!("22222222-2222-4222-8222-222222222222"),
                json!("2024-01-01T00:00:00Z"),
                json!("11111111-1111-4111-8111-111111111111"),
            ]
        );
    }

    #[test]
    fn limit_is_capped_and_negative_values_rejected() {
        let mut filter = Filter::new("blogs").unwrap().with_max_limit(Some(100));
        filter.limit(Some(5000), None).unwrap();
        assert!(filter.to_sql().unwrap().query.ends_with("LIMIT 100"));

        assert!(matches!(filter.limit(Some(-1), None), Err(FilterError::InvalidLimit(_))));
        assert!(matches!(filter.limit(None, Some(-1)), Err(FilterError::InvalidOffset(_))));
    }
}
