use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service banner
pub async fn root_get(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.store.backend(),
    }))
}

/// GET /health - 503 while the store is unreachable
pub async fn health_get(State(state): State<AppState>) -> ApiResult<Value> {
    match state.store.health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({
            "status": "ok",
            "storage": state.store.backend(),
            "connection": state.store.connection_state(),
        }))),
        Err(e) => {
            tracing::error!(
                "Health check failed ({:?}): {}",
                state.store.connection_state(),
                e
            );
            Err(ApiError::service_unavailable("Store unavailable"))
        }
    }
}
