use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::{ConnectionState, DatabaseError};
use crate::database::models::{Blog, BlogPatch, Category, NewBlog, NewCategory, NewUser, User};
use crate::listing::{FilterDescriptor, PageRequest};

/// Persistence behind the HTTP handlers.
///
/// Lookups return `Ok(None)` for a missing row; the handler decides whether
/// that is a 404. Updates and deletes return the affected row the same way.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Short name for logs and `/health`
    fn backend(&self) -> &'static str;

    /// Stores without a connection lifecycle are always connected
    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    async fn ensure_connected(&self) -> Result<(), DatabaseError>;
    async fn health_check(&self) -> Result<(), DatabaseError>;
    async fn close(&self) {}

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError>;
    async fn update_username(&self, id: Uuid, username: String) -> Result<Option<User>, DatabaseError>;
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    async fn list_categories(&self, owner: Uuid) -> Result<Vec<Category>, DatabaseError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError>;
    async fn find_owned_category(&self, id: Uuid, owner: Uuid) -> Result<Option<Category>, DatabaseError>;
    async fn create_category(&self, new_category: NewCategory) -> Result<Category, DatabaseError>;
    async fn update_category(&self, id: Uuid, title: String) -> Result<Option<Category>, DatabaseError>;
    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError>;

    /// Blogs matching `filter`, oldest first (ties broken by id), one page of them
    async fn find_blogs(&self, filter: &FilterDescriptor, page: &PageRequest) -> Result<Vec<Blog>, DatabaseError>;
    async fn find_blog(&self, id: Uuid, owner: Uuid, category: Option<Uuid>) -> Result<Option<Blog>, DatabaseError>;
    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, DatabaseError>;
    async fn update_blog(&self, id: Uuid, patch: BlogPatch) -> Result<Option<Blog>, DatabaseError>;
    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, DatabaseError>;
}
