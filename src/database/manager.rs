use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map a failed INSERT/UPDATE, turning unique violations into `Conflict`
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::Conflict(format!("{} already exists", what));
            }
        }
        DatabaseError::Sqlx(err)
    }
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        DatabaseError::QueryError(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Connected,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Uninitialized,
        }
    }
}

/// Owns the single Postgres pool and its connect-once lifecycle.
///
/// `ensure_connected` is safe to call before every operation: once connected
/// it returns the cached pool, and callers arriving while a connect is in
/// flight wait for that attempt instead of starting another. A failed attempt
/// leaves the manager uninitialized so the next call retries.
pub struct DatabaseManager {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
    state: AtomicU8,
}

impl DatabaseManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
            state: AtomicU8::new(ConnectionState::Uninitialized as u8),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub async fn ensure_connected(&self) -> Result<&PgPool, DatabaseError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<PgPool, DatabaseError> {
        self.set_state(ConnectionState::Connecting);
        info!("Connecting to database: {}", self.config.name);

        match self.try_connect().await {
            Ok(pool) => {
                self.set_state(ConnectionState::Connected);
                info!("Connected to database: {}", self.config.name);
                Ok(pool)
            }
            Err(e) => {
                self.set_state(ConnectionState::Uninitialized);
                error!("Failed to connect to database {}: {}", self.config.name, e);
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(self.config.url.as_deref(), &self.config.name)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.connection_timeout))
            .connect(&connection_string)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        super::schema::bootstrap(&pool).await?;
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.ensure_connected().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool on shutdown, if one was ever opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Closed database pool: {}", self.config.name);
        }
    }

    /// Swap the database name into the path of the base URL
    fn build_connection_string(base: Option<&str>, database_name: &str) -> Result<String, DatabaseError> {
        let base = base.ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        if !Self::is_valid_db_name(database_name) {
            return Err(DatabaseError::InvalidDatabaseName(database_name.to_string()));
        }

        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_path(&format!("/{}", database_name));
        Ok(url.into())
    }

    fn is_valid_db_name(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
