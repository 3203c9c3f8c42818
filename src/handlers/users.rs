use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;

use super::utils::{owner_id, require_user, required_text, OwnerQuery};
use crate::app::AppState;
use crate::database::models::{NewUser, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameUserBody {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "newUsername")]
    pub new_username: Option<String>,
}

/// GET /api/users
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(users))
}

/// POST /api/users
pub async fn users_post(
    State(state): State<AppState>,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> ApiResult<User> {
    let Json(body) = body?;
    let email = required_text(body.email, "email")?;
    let username = required_text(body.username, "username")?;

    let user = state.store.create_user(NewUser { email, username }).await?;
    tracing::info!("Created user {}", user.id);
    Ok(ApiResponse::created(user).with_message("User created"))
}

/// PATCH /api/users - rename
pub async fn users_patch(
    State(state): State<AppState>,
    body: Result<Json<RenameUserBody>, JsonRejection>,
) -> ApiResult<User> {
    let Json(body) = body?;
    let id = owner_id(body.user_id.as_deref())?;
    let username = required_text(body.new_username, "newUsername")?;

    require_user(state.store.as_ref(), id).await?;
    let user = state
        .store
        .update_username(id, username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::success(user).with_message("Username updated"))
}

/// DELETE /api/users?userId=..
pub async fn users_delete(
    State(state): State<AppState>,
    query: Result<Query<OwnerQuery>, QueryRejection>,
) -> ApiResult<User> {
    let Query(query) = query?;
    let id = query.owner()?;
    let user = state
        .store
        .delete_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!("Deleted user {}", user.id);
    Ok(ApiResponse::success(user).with_message("User deleted"))
}
