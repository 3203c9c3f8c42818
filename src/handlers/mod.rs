// handlers/mod.rs - route handlers, one module per resource
//
// Public: / and /health
// Bearer token required: /api/users, /api/categories, /api/blogs

pub mod blogs;
pub mod categories;
pub mod root;
pub mod users;
pub mod utils;

pub use blogs::{blog_delete, blog_get, blog_patch, blogs_get, blogs_post};
pub use categories::{categories_delete, categories_get, categories_patch, categories_post};
pub use root::{health_get, root_get};
pub use users::{users_delete, users_get, users_patch, users_post};
