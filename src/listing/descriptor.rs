use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::ValidationError;
use super::identifier::Identifier;
use crate::database::models::Blog;
use crate::filter::FilterError;

pub const OWNER_COLUMN: &str = "user_id";
pub const CATEGORY_COLUMN: &str = "category_id";
pub const TITLE_COLUMN: &str = "title";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Free-text search term, matched case-insensitively as a literal substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Keywords(String);

impl Keywords {
    /// Returns `None` for input that is empty after trimming
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.0.to_lowercase())
    }

    /// `%term%` with LIKE metacharacters escaped, so the term never acts as a pattern
    fn to_ilike_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        pattern.push('%');
        for c in self.0.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    fn from_ilike_pattern(pattern: &str) -> Option<Self> {
        let inner = pattern.strip_prefix('%')?.strip_suffix('%')?;
        let mut term = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => term.push(chars.next()?),
                // A bare wildcard was not produced by to_ilike_pattern
                '%' | '_' => return None,
                other => term.push(other),
            }
        }
        Self::new(&term).filter(|k| k.0 == term)
    }
}

/// Inclusive interval over creation timestamps; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// `Ok(None)` when neither bound is given. Inverted bounds are rejected.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, ValidationError> {
        match (start, end) {
            (None, None) => Ok(None),
            (Some(s), Some(e)) if s > e => Err(ValidationError::InvalidDateRange),
            _ => Ok(Some(Self { start, end })),
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// Validated, immutable constraints for one blog listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDescriptor {
    owner: Identifier,
    category: Identifier,
    keywords: Option<Keywords>,
    date_range: Option<DateRange>,
}

impl FilterDescriptor {
    pub fn new(owner: Identifier, category: Identifier) -> Self {
        Self {
            owner,
            category,
            keywords: None,
            date_range: None,
        }
    }

    pub fn with_keywords(mut self, keywords: Option<Keywords>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_date_range(mut self, date_range: Option<DateRange>) -> Self {
        self.date_range = date_range;
        self
    }

    pub fn owner(&self) -> &Identifier {
        &self.owner
    }

    pub fn category(&self) -> &Identifier {
        &self.category
    }

    pub fn keywords(&self) -> Option<&Keywords> {
        self.keywords.as_ref()
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// Evaluate the descriptor against a blog held in memory
    pub fn matches(&self, blog: &Blog) -> bool {
        if self.owner != blog.user_id || self.category != blog.category_id {
            return false;
        }
        if let Some(keywords) = &self.keywords {
            let in_description = blog
                .description
                .as_deref()
                .is_some_and(|d| keywords.matches(d));
            if !keywords.matches(&blog.title) && !in_description {
                return false;
            }
        }
        self.date_range.map_or(true, |range| range.contains(blog.created_at))
    }

    /// Render as a where-clause for [`crate::filter::Filter`]. Absent sub-filters are omitted.
    pub fn to_where(&self) -> Value {
        let mut clause = Map::new();
        clause.insert(OWNER_COLUMN.to_string(), Value::String(self.owner.to_string()));
        clause.insert(CATEGORY_COLUMN.to_string(), Value::String(self.category.to_string()));

        if let Some(keywords) = &self.keywords {
            let pattern = Value::String(keywords.to_ilike_pattern());
            let alternatives = [TITLE_COLUMN, DESCRIPTION_COLUMN]
                .into_iter()
                .map(|column| {
                    let mut op = Map::new();
                    op.insert("$ilike".to_string(), pattern.clone());
                    let mut field = Map::new();
                    field.insert(column.to_string(), Value::Object(op));
                    Value::Object(field)
                })
                .collect();
            clause.insert("$or".to_string(), Value::Array(alternatives));
        }

        if let Some(range) = &self.date_range {
            let mut bounds = Map::new();
            if let Some(start) = range.start {
                bounds.insert("$gte".to_string(), Value::String(format_timestamp(start)));
            }
            if let Some(end) = range.end {
                bounds.insert("$lte".to_string(), Value::String(format_timestamp(end)));
            }
            clause.insert(CREATED_AT_COLUMN.to_string(), Value::Object(bounds));
        }

        Value::Object(clause)
    }

    /// Inverse of [`FilterDescriptor::to_where`]
    pub fn from_where(where_data: &Value) -> Result<Self, FilterError> {
        let obj = where_data
            .as_object()
            .ok_or_else(|| invalid("where clause must be an object"))?;

        let owner = read_identifier(obj, OWNER_COLUMN)?;
        let category = read_identifier(obj, CATEGORY_COLUMN)?;
        let mut descriptor = Self::new(owner, category);

        for (key, value) in obj {
            match key.as_str() {
                OWNER_COLUMN | CATEGORY_COLUMN => {}
                "$or" => descriptor.keywords = Some(read_keywords(value)?),
                CREATED_AT_COLUMN => descriptor.date_range = read_date_range(value)?,
                other => return Err(invalid(&format!("unexpected key '{}'", other))),
            }
        }

        Ok(descriptor)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn invalid(msg: &str) -> FilterError {
    FilterError::InvalidWhereClause(msg.to_string())
}

fn read_identifier(obj: &Map<String, Value>, column: &str) -> Result<Identifier, FilterError> {
    obj.get(column)
        .and_then(Value::as_str)
        .and_then(Identifier::parse)
        .ok_or_else(|| invalid(&format!("'{}' must be an identifier", column)))
}

fn read_keywords(value: &Value) -> Result<Keywords, FilterError> {
    let alternatives = value
        .as_array()
        .ok_or_else(|| invalid("$or requires array"))?;

    let mut patterns = Vec::with_capacity(alternatives.len());
    for (alt, column) in alternatives.iter().zip([TITLE_COLUMN, DESCRIPTION_COLUMN]) {
        let pattern = alt
            .get(column)
            .and_then(|op| op.get("$ilike"))
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(&format!("$or expects {{\"{}\": {{\"$ilike\": ..}}}}", column)))?;
        patterns.push(pattern);
    }

    match patterns.as_slice() {
        [title, description] if alternatives.len() == 2 && title == description => {
            Keywords::from_ilike_pattern(title).ok_or_else(|| invalid("malformed keyword pattern"))
        }
        _ => Err(invalid("$or must match title and description with one pattern")),
    }
}

fn read_date_range(value: &Value) -> Result<Option<DateRange>, FilterError> {
    let bounds = value
        .as_object()
        .ok_or_else(|| invalid("created_at requires an operator object"))?;

    let mut start = None;
    let mut end = None;
    for (op, raw) in bounds {
        let ts = raw
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or_else(|| invalid(&format!("{} requires an RFC 3339 timestamp", op)))?;
        match op.as_str() {
            "$gte" => start = Some(ts),
            "$lte" => end = Some(ts),
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    DateRange::new(start, end).map_err(|e| invalid(&e.to_string()))
}
