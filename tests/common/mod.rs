#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use blog_api::config::AppConfig;
use blog_api::database::MemoryStore;
use blog_api::{router, AppState};

pub const TOKEN: &str = "integration-test-token";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serve the app on a free port with an in-memory store
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::from_config(Arc::new(MemoryStore::new()), &config);
        let app = router(state, &config);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the bearer token already attached
    pub fn api(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path)).bearer_auth(TOKEN)
    }

    pub async fn create_user(&self, username: &str) -> Result<Value> {
        let res = self
            .api(Method::POST, "/api/users")
            .json(&json!({ "email": format!("{}@example.com", username), "username": username }))
            .send()
            .await?;
        expect_data(res, StatusCode::CREATED).await
    }

    pub async fn create_category(&self, user_id: &str, title: &str) -> Result<Value> {
        let res = self
            .api(Method::POST, &format!("/api/categories?userId={}", user_id))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        expect_data(res, StatusCode::CREATED).await
    }

    pub async fn create_blog(&self, user_id: &str, category_id: &str, title: &str, description: &str) -> Result<Value> {
        let res = self
            .api(
                Method::POST,
                &format!("/api/blogs?userId={}&categoryId={}", user_id, category_id),
            )
            .json(&json!({ "title": title, "description": description }))
            .send()
            .await?;
        expect_data(res, StatusCode::CREATED).await
    }
}

/// Assert the status and success envelope, returning `data`
pub async fn expect_data(res: reqwest::Response, status: StatusCode) -> Result<Value> {
    let actual = res.status();
    let body = res.json::<Value>().await?;
    anyhow::ensure!(actual == status, "expected {}, got {}: {}", status, actual, body);
    anyhow::ensure!(body["success"] == json!(true), "success flag false or missing: {}", body);
    body.get("data").cloned().context("missing data field")
}

/// Assert an error status and return the error body
pub async fn expect_error(res: reqwest::Response, status: StatusCode) -> Result<Value> {
    let actual = res.status();
    let body = res.json::<Value>().await?;
    anyhow::ensure!(actual == status, "expected {}, got {}: {}", status, actual, body);
    anyhow::ensure!(body["error"] == json!(true), "error flag false or missing: {}", body);
    Ok(body)
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}
