use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Blog, BlogPatch, Category, NewBlog, NewCategory, NewUser, User};
use crate::database::store::BlogStore;
use crate::listing::{FilterDescriptor, PageRequest};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    blogs: HashMap<Uuid, Blog>,
}

/// In-process store with the same constraints as the Postgres schema:
/// unique email/username, unique category title per user, cascading deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a blog as-is, keeping its timestamps
    pub async fn seed_blog(&self, blog: Blog) {
        self.tables.write().await.blogs.insert(blog.id, blog);
    }
}

fn creation_sorted<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (chrono::DateTime<Utc>, Uuid),
{
    rows.sort_by_key(|row| key(row));
    rows
}

#[async_trait]
impl BlogStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ensure_connected(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        let users = tables.users.values().cloned().collect();
        Ok(creation_sorted(users, |u: &User| (u.created_at, u.id)))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email == new_user.email || u.username == new_user.username)
        {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }
        let user = new_user.into_user(Utc::now());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_username(&self, id: Uuid, username: String) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.id != id && u.username == username) {
            return Err(DatabaseError::Conflict("Username already exists".to_string()));
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.username = username;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id);
        if removed.is_some() {
            tables.categories.retain(|_, c| c.user_id != id);
            tables.blogs.retain(|_, b| b.user_id != id);
        }
        Ok(removed)
    }

    async fn list_categories(&self, owner: Uuid) -> Result<Vec<Category>, DatabaseError> {
        let tables = self.tables.read().await;
        let categories = tables
            .categories
            .values()
            .filter(|c| c.user_id == owner)
            .cloned()
            .collect();
        Ok(creation_sorted(categories, |c: &Category| (c.created_at, c.id)))
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_owned_category(&self, id: Uuid, owner: Uuid) -> Result<Option<Category>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .categories
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned())
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&new_category.user_id) {
            return Err(DatabaseError::QueryError(format!(
                "user {} does not exist",
                new_category.user_id
            )));
        }
        if tables
            .categories
            .values()
            .any(|c| c.user_id == new_category.user_id && c.title == new_category.title)
        {
            return Err(DatabaseError::Conflict("Category already exists".to_string()));
        }
        let category = new_category.into_category(Utc::now());
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, title: String) -> Result<Option<Category>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(owner) = tables.categories.get(&id).map(|c| c.user_id) else {
            return Ok(None);
        };
        if tables
            .categories
            .values()
            .any(|c| c.id != id && c.user_id == owner && c.title == title)
        {
            return Err(DatabaseError::Conflict("Category already exists".to_string()));
        }
        Ok(tables.categories.get_mut(&id).map(|category| {
            category.title = title;
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let removed = tables.categories.remove(&id);
        if removed.is_some() {
            tables.blogs.retain(|_, b| b.category_id != id);
        }
        Ok(removed)
    }

    async fn find_blogs(&self, filter: &FilterDescriptor, page: &PageRequest) -> Result<Vec<Blog>, DatabaseError> {
        let tables = self.tables.read().await;
        let matching = tables.blogs.values().filter(|b| filter.matches(b)).cloned().collect();
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);

        Ok(creation_sorted(matching, |b: &Blog| (b.created_at, b.id))
            .into_iter()
            .skip(offset)
            .take(page.size() as usize)
            .collect())
    }

    async fn find_blog(&self, id: Uuid, owner: Uuid, category: Option<Uuid>) -> Result<Option<Blog>, DatabaseError> {
        Ok(self
            .tables
            .read()
            .await
            .blogs
            .get(&id)
            .filter(|b| b.user_id == owner && category.map_or(true, |c| b.category_id == c))
            .cloned())
    }

    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, DatabaseError> {
        let mut tables = self.tables.write().await;
        let category_ok = tables
            .categories
            .get(&new_blog.category_id)
            .is_some_and(|c| c.user_id == new_blog.user_id);
        if !category_ok {
            return Err(DatabaseError::QueryError(format!(
                "category {} does not exist for user {}",
                new_blog.category_id, new_blog.user_id
            )));
        }
        let blog = new_blog.into_blog(Utc::now());
        tables.blogs.insert(blog.id, blog.clone());
        Ok(blog)
    }

    async fn update_blog(&self, id: Uuid, patch: BlogPatch) -> Result<Option<Blog>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.blogs.get_mut(&id).map(|blog| {
            patch.apply(blog, Utc::now());
            blog.clone()
        }))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, DatabaseError> {
        Ok(self.tables.write().await.blogs.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{DateRange, Identifier, Keywords};
    use chrono::{DateTime, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    async fn fixture() -> (MemoryStore, User, Category) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "ada@example.com".into(),
                username: "ada".into(),
            })
            .await
            .unwrap();
        let category = store
            .create_category(NewCategory {
                title: "rust".into(),
                user_id: user.id,
            })
            .await
            .unwrap();
        (store, user, category)
    }

    fn blog(user: &User, category: &Category, title: &str, created_at: DateTime<Utc>) -> Blog {
        Blog {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            user_id: user.id,
            category_id: category.id,
            created_at,
            updated_at: created_at,
        }
    }

    fn descriptor(user: &User, category: &Category) -> FilterDescriptor {
        FilterDescriptor::new(Identifier::from(user.id), Identifier::from(category.id))
    }

    #[tokio::test]
    async fn duplicate_user_conflicts() {
        let (store, _, _) = fixture().await;
        let err = store
            .create_user(NewUser {
                email: "other@example.com".into(),
                username: "ada".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn category_title_unique_per_user() {
        let (store, user, _) = fixture().await;
        let err = store
            .create_category(NewCategory {
                title: "rust".into(),
                user_id: user.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let other = store
            .create_user(NewUser {
                email: "bob@example.com".into(),
                username: "bob".into(),
            })
            .await
            .unwrap();
        assert!(store
            .create_category(NewCategory {
                title: "rust".into(),
                user_id: other.id,
            })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn find_blogs_sorts_and_pages() {
        let (store, user, category) = fixture().await;
        for (day, title) in [(5, "third"), (1, "first"), (3, "second"), (7, "fourth")] {
            store.seed_blog(blog(&user, &category, title, at(day))).await;
        }

        let filter = descriptor(&user, &category);
        let page = store.find_blogs(&filter, &PageRequest::new(2, 2)).await.unwrap();
        let titles: Vec<_> = page.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["third", "fourth"]);

        let beyond = store.find_blogs(&filter, &PageRequest::new(3, 2)).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn find_blogs_applies_keywords_and_range() {
        let (store, user, category) = fixture().await;
        store.seed_blog(blog(&user, &category, "Async Rust", at(2))).await;
        store.seed_blog(blog(&user, &category, "async traits", at(10))).await;
        store.seed_blog(blog(&user, &category, "Lifetimes", at(3))).await;

        let filter = descriptor(&user, &category)
            .with_keywords(Keywords::new("ASYNC"))
            .with_date_range(DateRange::new(Some(at(1)), Some(at(5))).unwrap());
        let found = store.find_blogs(&filter, &PageRequest::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Async Rust");
    }

    #[tokio::test]
    async fn find_blog_scopes_to_owner_and_category() {
        let (store, user, category) = fixture().await;
        let seeded = blog(&user, &category, "mine", at(1));
        store.seed_blog(seeded.clone()).await;

        assert!(store.find_blog(seeded.id, user.id, None).await.unwrap().is_some());
        assert!(store
            .find_blog(seeded.id, user.id, Some(category.id))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_blog(seeded.id, Uuid::new_v4(), None)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_blog(seeded.id, user.id, Some(Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_blog_changes_only_supplied_fields() {
        let (store, user, category) = fixture().await;
        let created = store
            .create_blog(NewBlog {
                title: "draft".into(),
                description: Some("body".into()),
                user_id: user.id,
                category_id: category.id,
            })
            .await
            .unwrap();

        let updated = store
            .update_blog(
                created.id,
                BlogPatch {
                    title: Some("final".into()),
                    description: None,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.description.as_deref(), Some("body"));
        assert!(updated.updated_at >= created.updated_at);

        let cleared = store
            .update_blog(
                created.id,
                BlogPatch {
                    title: None,
                    description: Some(None),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.title, "final");
        assert!(cleared.description.is_none());
    }

    #[tokio::test]
    async fn deletes_cascade() {
        let (store, user, category) = fixture().await;
        let seeded = blog(&user, &category, "gone soon", at(1));
        store.seed_blog(seeded.clone()).await;

        store.delete_category(category.id).await.unwrap();
        assert!(store.find_blog(seeded.id, user.id, None).await.unwrap().is_none());

        let category = store
            .create_category(NewCategory {
                title: "again".into(),
                user_id: user.id,
            })
            .await
            .unwrap();
        store.delete_user(user.id).await.unwrap();
        assert!(store.find_category(category.id).await.unwrap().is_none());
        assert!(store.list_users().await.unwrap().is_empty());
    }
}
