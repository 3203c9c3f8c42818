use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::manager::{ConnectionState, DatabaseError, DatabaseManager};
use crate::database::models::{Blog, BlogPatch, Category, NewBlog, NewCategory, NewUser, User};
use crate::database::repository::Repository;
use crate::database::store::BlogStore;
use crate::filter::FilterData;
use crate::listing::{FilterDescriptor, PageRequest};

const CREATION_ORDER: &str = "created_at asc, id asc";

/// Postgres-backed store; connects on first use
pub struct PgStore {
    manager: DatabaseManager,
    max_page_size: Option<i64>,
}

impl PgStore {
    pub fn new(manager: DatabaseManager) -> Self {
        Self {
            manager,
            max_page_size: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            manager: DatabaseManager::new(config.database.clone()),
            max_page_size: config.listing.max_page_size.map(i64::from),
        }
    }

    async fn pool(&self) -> Result<&PgPool, DatabaseError> {
        self.manager.ensure_connected().await
    }
}

#[async_trait]
impl BlogStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn connection_state(&self) -> ConnectionState {
        self.manager.state()
    }

    async fn ensure_connected(&self) -> Result<(), DatabaseError> {
        self.pool().await.map(|_| ())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.manager.health_check().await
    }

    async fn close(&self) {
        self.manager.close().await
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let pool = self.pool().await?;
        Repository::<User>::new(pool)
            .select_any(FilterData {
                order: Some(json!(CREATION_ORDER)),
                ..Default::default()
            })
            .await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let pool = self.pool().await?;
        Repository::<User>::new(pool).select_id(id).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let pool = self.pool().await?;
        let user = new_user.into_user(Utc::now());
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, username, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "User"))
    }

    async fn update_username(&self, id: Uuid, username: String) -> Result<Option<User>, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(username)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Username"))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let pool = self.pool().await?;
        Ok(sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    async fn list_categories(&self, owner: Uuid) -> Result<Vec<Category>, DatabaseError> {
        let pool = self.pool().await?;
        Repository::<Category>::new(pool)
            .select_any(FilterData {
                where_clause: Some(json!({ "user_id": owner.to_string() })),
                order: Some(json!(CREATION_ORDER)),
                ..Default::default()
            })
            .await
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let pool = self.pool().await?;
        Repository::<Category>::new(pool).select_id(id).await
    }

    async fn find_owned_category(&self, id: Uuid, owner: Uuid) -> Result<Option<Category>, DatabaseError> {
        let pool = self.pool().await?;
        Repository::<Category>::new(pool)
            .select_one(FilterData {
                where_clause: Some(json!({ "id": id.to_string(), "user_id": owner.to_string() })),
                ..Default::default()
            })
            .await
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category, DatabaseError> {
        let pool = self.pool().await?;
        let category = new_category.into_category(Utc::now());
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, title, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(category.id)
        .bind(&category.title)
        .bind(category.user_id)
        .bind(category.created_at)
        .bind(category.updated_at)
        .fetch_one(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Category"))
    }

    async fn update_category(&self, id: Uuid, title: String) -> Result<Option<Category>, DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET title = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Category"))
    }

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let pool = self.pool().await?;
        Ok(sqlx::query_as::<_, Category>("DELETE FROM categories WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    async fn find_blogs(&self, filter: &FilterDescriptor, page: &PageRequest) -> Result<Vec<Blog>, DatabaseError> {
        let pool = self.pool().await?;
        // Past the end of any table
        let Ok(offset) = i64::try_from(page.offset()) else {
            return Ok(Vec::new());
        };

        Repository::<Blog>::new(pool)
            .with_max_limit(self.max_page_size)
            .select_any(FilterData {
                where_clause: Some(filter.to_where()),
                order: Some(json!(CREATION_ORDER)),
                limit: Some(i64::from(page.size())),
                offset: Some(offset),
            })
            .await
    }

    async fn find_blog(&self, id: Uuid, owner: Uuid, category: Option<Uuid>) -> Result<Option<Blog>, DatabaseError> {
        let pool = self.pool().await?;
        let mut where_clause = json!({ "id": id.to_string(), "user_id": owner.to_string() });
        if let Some(category) = category {
            where_clause["category_id"] = json!(category.to_string());
        }

        Repository::<Blog>::new(pool)
            .select_one(FilterData {
                where_clause: Some(where_clause),
                ..Default::default()
            })
            .await
    }

    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, DatabaseError> {
        let pool = self.pool().await?;
        let blog = new_blog.into_blog(Utc::now());
        sqlx::query_as::<_, Blog>(
            "INSERT INTO blogs (id, title, description, user_id, category_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(blog.id)
        .bind(&blog.title)
        .bind(&blog.description)
        .bind(blog.user_id)
        .bind(blog.category_id)
        .bind(blog.created_at)
        .bind(blog.updated_at)
        .fetch_one(pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "Blog"))
    }

    async fn update_blog(&self, id: Uuid, patch: BlogPatch) -> Result<Option<Blog>, DatabaseError> {
        let pool = self.pool().await?;
        // COALESCE keeps a title the patch leaves out; $3 says whether description is set at all
        Ok(sqlx::query_as::<_, Blog>(
            "UPDATE blogs SET title = COALESCE($2, title), \
             description = CASE WHEN $3 THEN $4 ELSE description END, \
             updated_at = $5 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description.is_some())
        .bind(patch.description.flatten())
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, DatabaseError> {
        let pool = self.pool().await?;
        Ok(sqlx::query_as::<_, Blog>("DELETE FROM blogs WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }
}
