use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;

use super::utils::{category_id, require_category, require_user, required_text, OwnerQuery};
use crate::app::AppState;
use crate::database::models::{Category, NewCategory};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub title: Option<String>,
}

/// GET /api/categories?userId=..
pub async fn categories_get(
    State(state): State<AppState>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<Vec<Category>> {
    let Query(query) = query?;
    let owner = query.owner()?;
    require_user(state.store.as_ref(), owner).await?;

    let categories = state.store.list_categories(owner).await?;
    Ok(ApiResponse::success(categories))
}

/// POST /api/categories?userId=..
pub async fn categories_post(
    State(state): State<AppState>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<CategoryBody>, JsonRejection>,
) -> ApiResult<Category> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let Json(body) = body?;
    let title = required_text(body.title, "title")?;
    require_user(state.store.as_ref(), owner).await?;

    let category = state
        .store
        .create_category(NewCategory { title, user_id: owner })
        .await?;
    Ok(ApiResponse::created(category).with_message("Category created"))
}

/// PATCH /api/categories/:category?userId=..
pub async fn categories_patch(
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<CategoryBody>, JsonRejection>,
) -> ApiResult<Category> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let id = category_id(Some(&category))?;
    let Json(body) = body?;
    let title = required_text(body.title, "title")?;

    require_user(state.store.as_ref(), owner).await?;
    require_category(state.store.as_ref(), id, owner).await?;

    let category = state
        .store
        .update_category(id, title)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(ApiResponse::success(category).with_message("Category updated"))
}

/// DELETE /api/categories/:category?userId=.. - also removes its blogs
pub async fn categories_delete(
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<Category> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let id = category_id(Some(&category))?;

    require_user(state.store.as_ref(), owner).await?;
    require_category(state.store.as_ref(), id, owner).await?;

    let category = state
        .store
        .delete_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(ApiResponse::success(category).with_message("Category deleted"))
}
