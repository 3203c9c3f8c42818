use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter::is_valid_identifier;
use super::types::{FilterOp, FilterWhereInfo, FilterWhereOptions};

/// Compiles a JSON where-clause into a parameterised SQL predicate.
///
/// Keys are visited in sorted order so the same clause always yields the
/// same SQL and parameter order.
pub struct FilterWhere<'a> {
    options: &'a FilterWhereOptions,
    param_base: usize,
    param_values: Vec<Value>,
}

impl<'a> FilterWhere<'a> {
    fn new(starting_param_index: usize, options: &'a FilterWhereOptions) -> Self {
        Self {
            options,
            param_base: starting_param_index,
            param_values: vec![],
        }
    }

    /// `starting_param_index` is the number of parameters already bound; the
    /// first placeholder emitted is `$starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        options: &FilterWhereOptions,
    ) -> Result<(String, Vec<Value>), FilterError> {
        Self::validate(where_data)?;
        let mut filter_where = FilterWhere::new(starting_param_index, options);
        let conditions = match where_data {
            Value::Null => vec![],
            other => filter_where.parse_group(other)?,
        };
        let where_clause = join_or_default(&conditions, " AND ", "1=1");
        Ok((where_clause, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_group(&mut self, where_data: &Value) -> Result<Vec<String>, FilterError> {
        let obj = where_data
            .as_object()
            .ok_or_else(|| FilterError::InvalidWhereClause("Unsupported WHERE format".to_string()))?;

        let mut conditions = vec![];
        for (key, value) in sorted_entries(obj) {
            if key.starts_with('$') {
                conditions.push(self.parse_logical_operator(key, value)?);
            } else {
                conditions.extend(self.parse_field_condition(key, value)?);
            }
        }
        Ok(conditions)
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    let group = self.parse_group(v)?;
                    sql_parts.push(format!("({})", join_or_default(&group, " AND ", "1=1")));
                }
                // Empty $and is vacuously true, empty $or can never match
                let (joiner, empty) = if op == "$and" { (" AND ", "1=1") } else { (" OR ", "1=0") };
                Ok(format!("({})", join_or_default(&sql_parts, joiner, empty)))
            }
            "$not" => {
                let group = self.parse_group(value)?;
                Ok(format!("NOT ({})", join_or_default(&group, " AND ", "1=1")))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", field)));
        }

        let infos = match value {
            Value::Object(obj) => sorted_entries(obj)
                .map(|(op_key, op_val)| {
                    let operator = FilterOp::from_key(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.to_string()))?;
                    Ok::<_, FilterError>(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() })
                })
                .collect::<Result<Vec<_>, _>>()?,
            // Implicit equality: { field: value }
            other => vec![FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: other.clone() }],
        };

        infos.iter().map(|info| self.build_sql_condition(info)).collect()
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let column = condition.column.as_str();

        match condition.operator {
            FilterOp::Eq if condition.data.is_null() => Ok(format!("{} IS NULL", quoted_column)),
            FilterOp::Ne if condition.data.is_null() => Ok(format!("{} IS NOT NULL", quoted_column)),
            FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
                let placeholder = self.scalar_param(column, condition)?;
                Ok(format!("{} {} {}", quoted_column, condition.operator.to_sql(), placeholder))
            }
            FilterOp::ILike => {
                if !condition.data.is_string() {
                    return Err(FilterError::InvalidOperatorData("$ilike requires a string pattern".to_string()));
                }
                let placeholder = self.param(column, condition.data.clone());
                Ok(format!("{} ILIKE {}", quoted_column, placeholder))
            }
            FilterOp::In => {
                let values = condition
                    .data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in requires array".to_string()))?;
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(column, v.clone())).collect();
                Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
            }
        }
    }

    fn scalar_param(&mut self, column: &str, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        match &condition.data {
            Value::Array(_) | Value::Object(_) => Err(FilterError::InvalidOperatorData(format!(
                "{} on '{}' requires a scalar value",
                condition.operator.to_sql(),
                column
            ))),
            scalar => Ok(self.param(column, scalar.clone())),
        }
    }

    fn param(&mut self, column: &str, value: Value) -> String {
        self.param_values.push(value);
        let index = self.param_base + self.param_values.len();
        format!("${}{}", index, self.options.kind_of(column).cast())
    }
}

fn sorted_entries(obj: &Map<String, Value>) -> impl Iterator<Item = (&String, &Value)> {
    let mut entries: Vec<_> = obj.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.into_iter()
}

fn join_or_default(parts: &[String], joiner: &str, empty: &str) -> String {
    if parts.is_empty() {
        empty.to_string()
    } else {
        parts.join(joiner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ColumnKind;
    use serde_json::json;

    fn blog_options() -> FilterWhereOptions {
        FilterWhereOptions::with_columns(&[
            ("user_id", ColumnKind::Uuid),
            ("category_id", ColumnKind::Uuid),
            ("created_at", ColumnKind::Timestamp),
        ])
    }

    #[test]
    fn empty_and_null_clauses_match_everything() {
        let options = FilterWhereOptions::default();
        assert_eq!(FilterWhere::generate(&json!({}), 0, &options).unwrap().0, "1=1");
        assert_eq!(FilterWhere::generate(&Value::Null, 0, &options).unwrap().0, "1=1");
    }

    #[test]
    fn implicit_equality_casts_by_column_kind() {
        let (sql, params) = FilterWhere::generate(
            &json!({"user_id": "u-1", "title": "hello"}),
            0,
            &blog_options(),
        )
        .unwrap();
        assert_eq!(sql, "\"title\" = $1 AND \"user_id\" = $2::uuid");
        assert_eq!(params, vec![json!("hello"), json!("u-1")]);
    }

    #[test]
    fn nested_groups_continue_parameter_numbering() {
        let (sql, params) = FilterWhere::generate(
            &json!({
                "$or": [{"title": {"$ilike": "%a%"}}, {"description": {"$ilike": "%a%"}}],
                "created_at": {"$gte": "2024-01-01T00:00:00Z", "$lte": "2024-06-01T00:00:00Z"},
            }),
            2,
            &blog_options(),
        )
        .unwrap();
        assert_eq!(
            sql,
            "((\"title\" ILIKE $3) OR (\"description\" ILIKE $4)) AND \"created_at\" >= $5::timestamptz AND \"created_at\" <= $6::timestamptz"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn null_in_and_not() {
        let (sql, _) = FilterWhere::generate(
            &json!({"description": null, "$not": {"id": {"$in": ["a", "b"]}}, "title": {"$in": []}}),
            0,
            &FilterWhereOptions::default(),
        )
        .unwrap();
        assert_eq!(sql, "NOT (\"id\" IN ($1, $2)) AND \"description\" IS NULL AND 1=0");
    }

    #[test]
    fn rejects_bad_input() {
        let options = FilterWhereOptions::default();
        assert!(matches!(
            FilterWhere::generate(&json!("1=1; DROP TABLE blogs"), 0, &options),
            Err(FilterError::InvalidWhereClause(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({"title\" OR 1=1 --": "x"}), 0, &options),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({"title": {"$regex": "x"}}), 0, &options),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({"title": {"$neq": "x"}}), 0, &options),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({"title": {"$gt": [1, 2]}}), 0, &options),
            Err(FilterError::InvalidOperatorData(_))
        ));
        assert!(matches!(
            FilterWhere::generate(&json!({"$xor": []}), 0, &options),
            Err(FilterError::UnsupportedOperator(_))
        ));
    }
}
