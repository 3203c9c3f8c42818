use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::descriptor::{DateRange, FilterDescriptor, Keywords};
use super::error::ValidationError;
use super::identifier::Identifier;
use super::page::{coerce_positive, PageRequest, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::config::ListingConfig;

/// Raw, untrusted listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "userId", alias = "owner")]
    pub owner: Option<String>,
    #[serde(rename = "categoryId", alias = "category")]
    pub category: Option<String>,
    #[serde(alias = "Keywords")]
    pub keywords: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "limit", alias = "size")]
    pub size: Option<String>,
}

/// Turns [`ListParams`] into a validated [`FilterDescriptor`] and [`PageRequest`].
///
/// Pure: no I/O, no shared state. Checks run owner, category, start date,
/// end date, range, and the first failure wins. Unparseable or non-positive
/// `page`/`size` values fall back to their defaults instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQueryBuilder {
    default_size: u32,
    max_size: Option<u32>,
}

impl ListQueryBuilder {
    pub fn new(default_size: u32, max_size: Option<u32>) -> Self {
        Self {
            default_size: default_size.max(1),
            max_size: max_size.map(|m| m.max(1)),
        }
    }

    pub fn from_config(config: &ListingConfig) -> Self {
        Self::new(config.default_page_size, config.max_page_size)
    }

    pub fn build(&self, params: &ListParams) -> Result<(FilterDescriptor, PageRequest), ValidationError> {
        let owner = Identifier::require(params.owner.as_deref(), ValidationError::InvalidOwner)?;
        let category = Identifier::require(params.category.as_deref(), ValidationError::InvalidCategory)?;

        let start = parse_date_param("startDate", params.start_date.as_deref())?;
        let end = parse_date_param("endDate", params.end_date.as_deref())?;
        let date_range = DateRange::new(start, end)?;

        let keywords = params.keywords.as_deref().and_then(Keywords::new);

        let filter = FilterDescriptor::new(owner, category)
            .with_keywords(keywords)
            .with_date_range(date_range);

        Ok((filter, self.page_request(params)))
    }

    fn page_request(&self, params: &ListParams) -> PageRequest {
        let page = coerce_positive(params.page.as_deref(), DEFAULT_PAGE);
        let mut size = coerce_positive(params.size.as_deref(), self.default_size);

        if let Some(max) = self.max_size {
            if size > max {
                tracing::warn!("Page size {} exceeds max {}, capping to max", size, max);
                size = max;
            }
        }

        PageRequest::new(page, size)
    }
}

impl Default for ListQueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, None)
    }
}

fn parse_date_param(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    parse_timestamp(raw).map(Some).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// Accepts RFC 3339, a zone-less date-time (read as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
