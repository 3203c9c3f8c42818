use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::{optional_text, require_category, require_user, required_text, resource_id, OwnerQuery};
use crate::app::AppState;
use crate::database::models::{Blog, BlogPatch, NewBlog};
use crate::error::ApiError;
use crate::listing::{ListParams, ValidationError};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct BlogBody {
    pub title: Option<String>,
    #[serde(alias = "desciption")]
    pub description: Option<String>,
}

/// GET /api/blogs - filtered, paginated listing
pub async fn blogs_get(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Blog>> {
    let Query(params) = params?;
    let (filter, page) = state.list_builder.build(&params)?;
    let owner = Uuid::from(*filter.owner());
    require_user(state.store.as_ref(), owner).await?;
    require_category(state.store.as_ref(), Uuid::from(*filter.category()), owner).await?;

    let blogs = state.store.find_blogs(&filter, &page).await?;
    tracing::debug!(
        "Listed {} blogs (page {}, size {})",
        blogs.len(),
        page.page(),
        page.size()
    );
    Ok(ApiResponse::success(blogs))
}

/// POST /api/blogs?userId=..&categoryId=..
pub async fn blogs_post(
    State(state): State<AppState>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<BlogBody>, JsonRejection>,
) -> ApiResult<Blog> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let category = query.category()?;
    let Json(body) = body?;
    let title = required_text(body.title, "title")?;

    require_user(state.store.as_ref(), owner).await?;
    require_category(state.store.as_ref(), category, owner).await?;

    let blog = state
        .store
        .create_blog(NewBlog {
            title,
            description: optional_text(body.description),
            user_id: owner,
            category_id: category,
        })
        .await?;
    Ok(ApiResponse::created(blog).with_message("Blog created"))
}

/// GET /api/blogs/:blog?userId=..&categoryId=..
pub async fn blog_get(
    State(state): State<AppState>,
    Path(blog): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<Blog> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let category = query.category()?;
    let id = resource_id(&blog, "blog")?;

    require_user(state.store.as_ref(), owner).await?;
    require_category(state.store.as_ref(), category, owner).await?;

    let blog = state
        .store
        .find_blog(id, owner, Some(category))
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;
    Ok(ApiResponse::success(blog))
}

/// PATCH /api/blogs/:blog?userId=..
pub async fn blog_patch(
    State(state): State<AppState>,
    Path(blog): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
    body: Result<Json<BlogBody>, JsonRejection>,
) -> ApiResult<Blog> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let id = resource_id(&blog, "blog")?;
    let Json(body) = body?;
    // A blank description clears it; a blank title is ignored
    let patch = BlogPatch {
        title: optional_text(body.title),
        description: body.description.map(|d| optional_text(Some(d))),
    };
    if patch.is_empty() {
        return Err(ValidationError::MissingField { field: "title" }.into());
    }

    require_user(state.store.as_ref(), owner).await?;
    state
        .store
        .find_blog(id, owner, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    let blog = state
        .store
        .update_blog(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;
    Ok(ApiResponse::success(blog).with_message("Blog updated"))
}

/// DELETE /api/blogs/:blog?userId=..
pub async fn blog_delete(
    State(state): State<AppState>,
    Path(blog): Path<String>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<Blog> {
    let Query(query) = query?;
    let owner = query.owner()?;
    let id = resource_id(&blog, "blog")?;

    require_user(state.store.as_ref(), owner).await?;
    state
        .store
        .find_blog(id, owner, None)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    let blog = state
        .store
        .delete_blog(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;
    Ok(ApiResponse::success(blog).with_message("Blog deleted"))
}
