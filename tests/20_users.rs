mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{id_of, TestServer};

#[tokio::test]
async fn create_and_list_users() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.create_user("ada").await?;
    server.create_user("grace").await?;

    assert_eq!(ada["username"], "ada");
    assert_eq!(ada["email"], "ada@example.com");

    let res = server.api(Method::GET, "/api/users").send().await?;
    let users = common::expect_data(res, StatusCode::OK).await?;
    let names: Vec<_> = users
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|u| u["username"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"ada".to_string()) && names.contains(&"grace".to_string()));
    Ok(())
}

#[tokio::test]
async fn create_user_requires_fields() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .api(Method::POST, "/api/users")
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("username").is_some(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.create_user("ada").await?;

    let res = server
        .api(Method::POST, "/api/users")
        .json(&json!({ "email": "ada@example.com", "username": "someone-else" }))
        .send()
        .await?;
    common::expect_error(res, StatusCode::CONFLICT).await?;
    Ok(())
}

#[tokio::test]
async fn rename_user() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.create_user("ada").await?;

    let res = server
        .api(Method::PATCH, "/api/users")
        .json(&json!({ "userId": id_of(&ada), "newUsername": "countess" }))
        .send()
        .await?;
    let updated = common::expect_data(res, StatusCode::OK).await?;
    assert_eq!(updated["username"], "countess");
    assert_eq!(updated["id"], ada["id"]);

    let res = server
        .api(Method::PATCH, "/api/users")
        .json(&json!({ "userId": "507f1f77bcf86cd799439011", "newUsername": "x" }))
        .send()
        .await?;
    let body = common::expect_error(res, StatusCode::BAD_REQUEST).await?;
    assert_eq!(body["message"], "Invalid User id");
    Ok(())
}

#[tokio::test]
async fn delete_user_then_missing() -> Result<()> {
    let server = TestServer::spawn().await?;
    let ada = server.create_user("ada").await?;
    let path = format!("/api/users?userId={}", id_of(&ada));

    let res = server.api(Method::DELETE, &path).send().await?;
    let deleted = common::expect_data(res, StatusCode::OK).await?;
    assert_eq!(deleted["id"], ada["id"]);

    let res = server.api(Method::DELETE, &path).send().await?;
    let body = common::expect_error(res, StatusCode::NOT_FOUND).await?;
    assert_eq!(body["message"], "User not found");
    Ok(())
}
