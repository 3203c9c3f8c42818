use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Category, User};
use crate::database::BlogStore;
use crate::error::ApiError;
use crate::listing::{Identifier, ValidationError};

/// `?userId=..&categoryId=..` on routes that scope to an owner
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    #[serde(rename = "userId", alias = "owner")]
    pub user_id: Option<String>,
    #[serde(rename = "categoryId", alias = "category")]
    pub category_id: Option<String>,
}

impl OwnerQuery {
    pub fn owner(&self) -> Result<Uuid, ValidationError> {
        owner_id(self.user_id.as_deref())
    }

    pub fn category(&self) -> Result<Uuid, ValidationError> {
        category_id(self.category_id.as_deref())
    }
}

pub fn owner_id(raw: Option<&str>) -> Result<Uuid, ValidationError> {
    Identifier::require(raw, ValidationError::InvalidOwner).map(Uuid::from)
}

pub fn category_id(raw: Option<&str>) -> Result<Uuid, ValidationError> {
    Identifier::require(raw, ValidationError::InvalidCategory).map(Uuid::from)
}

pub fn resource_id(raw: &str, resource: &'static str) -> Result<Uuid, ValidationError> {
    Identifier::require(Some(raw), ValidationError::InvalidResource { resource }).map(Uuid::from)
}

/// Trimmed, non-empty body field
pub fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    optional_text(value).ok_or(ValidationError::MissingField { field })
}

/// Trimmed body field; blank counts as absent
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn require_user(store: &dyn BlogStore, id: Uuid) -> Result<User, ApiError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Category that exists and belongs to `owner`
pub async fn require_category(store: &dyn BlogStore, id: Uuid, owner: Uuid) -> Result<Category, ApiError> {
    store
        .find_owned_category(id, owner)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_are_trimmed() {
        assert_eq!(required_text(Some("  hi ".into()), "title").unwrap(), "hi");
        assert_eq!(
            required_text(Some("   ".into()), "title"),
            Err(ValidationError::MissingField { field: "title" })
        );
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn resource_ids_name_the_resource() {
        assert_eq!(
            resource_id("nope", "blog"),
            Err(ValidationError::InvalidResource { resource: "blog" })
        );
        let id = Uuid::new_v4();
        assert_eq!(resource_id(&id.to_string(), "blog").unwrap(), id);
    }
}
