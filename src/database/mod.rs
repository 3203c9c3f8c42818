pub mod manager;
pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod query_builder;
pub mod repository;
pub mod schema;
pub mod store;

pub use manager::{ConnectionState, DatabaseError, DatabaseManager};
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use store::BlogStore;
