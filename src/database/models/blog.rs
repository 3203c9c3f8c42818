use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::ColumnKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for Blog {
    const NAME: &'static str = "blogs";
    const COLUMNS: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Uuid),
        ("user_id", ColumnKind::Uuid),
        ("category_id", ColumnKind::Uuid),
        ("created_at", ColumnKind::Timestamp),
        ("updated_at", ColumnKind::Timestamp),
    ];
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub category_id: Uuid,
}

impl NewBlog {
    pub fn into_blog(self, now: DateTime<Utc>) -> Blog {
        Blog {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            user_id: self.user_id,
            category_id: self.category_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct BlogPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

impl BlogPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    pub fn apply(self, blog: &mut Blog, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            blog.title = title;
        }
        if let Some(description) = self.description {
            blog.description = description;
        }
        blog.updated_at = now;
    }
}
