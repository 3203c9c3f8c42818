use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{validator_from_config, TokenValidator};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::BlogStore;
use crate::handlers;
use crate::listing::ListQueryBuilder;
use crate::middleware::bearer_auth_middleware;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub auth: Arc<dyn TokenValidator>,
    pub list_builder: ListQueryBuilder,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, auth: Arc<dyn TokenValidator>, list_builder: ListQueryBuilder) -> Self {
        Self {
            store,
            auth,
            list_builder,
        }
    }

    pub fn from_config(store: Arc<dyn BlogStore>, config: &AppConfig) -> Self {
        Self::new(
            store,
            validator_from_config(&config.security),
            ListQueryBuilder::from_config(&config.listing),
        )
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .merge(user_routes())
        .merge(category_routes())
        .merge(blog_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth_middleware));

    let mut app = Router::new()
        // Public
        .route("/", get(handlers::root_get))
        .route("/health", get(handlers::health_get))
        // Bearer token required
        .merge(api)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http());

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }

    app.with_state(state)
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new().route(
        "/api/users",
        get(users::users_get)
            .post(users::users_post)
            .patch(users::users_patch)
            .delete(users::users_delete),
    )
}

fn category_routes() -> Router<AppState> {
    use handlers::categories;

    Router::new()
        .route(
            "/api/categories",
            get(categories::categories_get).post(categories::categories_post),
        )
        .route(
            "/api/categories/:category",
            patch(categories::categories_patch).delete(categories::categories_delete),
        )
}

fn blog_routes() -> Router<AppState> {
    use handlers::blogs;

    Router::new()
        .route("/api/blogs", get(blogs::blogs_get).post(blogs::blogs_post))
        .route(
            "/api/blogs/:blog",
            get(blogs::blog_get)
                .patch(blogs::blog_patch)
                .delete(blogs::blog_delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
