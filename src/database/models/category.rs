use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;
use crate::filter::ColumnKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for Category {
    const NAME: &'static str = "categories";
    const COLUMNS: &'static [(&'static str, ColumnKind)] = &[
        ("id", ColumnKind::Uuid),
        ("user_id", ColumnKind::Uuid),
        ("created_at", ColumnKind::Timestamp),
        ("updated_at", ColumnKind::Timestamp),
    ];
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub user_id: Uuid,
}

impl NewCategory {
    pub fn into_category(self, now: DateTime<Utc>) -> Category {
        Category {
            id: Uuid::new_v4(),
            title: self.title,
            user_id: self.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
