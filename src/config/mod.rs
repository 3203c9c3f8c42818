use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub listing: ListingConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub storage: StorageBackend,
    pub url: Option<String>,
    pub name: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub default_page_size: u32,
    pub max_page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Presets first, then specific env vars win
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Applies overrides read through `lookup`; unparseable values keep the preset
    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Database overrides
        if let Some(v) = lookup("BLOG_API_STORAGE") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.storage = StorageBackend::Memory,
                "postgres" | "postgresql" => self.database.storage = StorageBackend::Postgres,
                other => tracing::warn!("Ignoring unknown BLOG_API_STORAGE value: {}", other),
            }
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Listing overrides
        if let Some(v) = lookup("LISTING_DEFAULT_PAGE_SIZE") {
            self.listing.default_page_size = v
                .parse()
                .ok()
                .filter(|size| *size > 0)
                .unwrap_or(self.listing.default_page_size);
        }
        if let Some(v) = lookup("LISTING_MAX_PAGE_SIZE") {
            match v.parse::<u32>() {
                Ok(0) | Err(_) => tracing::warn!("Ignoring invalid LISTING_MAX_PAGE_SIZE: {}", v),
                Ok(size) => self.listing.max_page_size = Some(size),
            }
        }

        // API overrides
        if let Some(port) = lookup("BLOG_API_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = Some(v).filter(|s| !s.is_empty());
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                storage: StorageBackend::Postgres,
                url: None,
                name: "blog_api".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            listing: ListingConfig {
                default_page_size: 10,
                max_page_size: Some(1000),
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
                jwt_secret: None,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                storage: StorageBackend::Postgres,
                url: None,
                name: "blog_api".to_string(),
                max_connections: 20,
                connection_timeout: 10,
            },
            listing: ListingConfig {
                default_page_size: 10,
                max_page_size: Some(500),
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: None,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                storage: StorageBackend::Postgres,
                url: None,
                name: "blog_api".to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            listing: ListingConfig {
                default_page_size: 10,
                max_page_size: Some(100),
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: None,
            },
        }
    }

    /// Default `RUST_LOG` directive when none is set
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Development => "blog_api=debug,tower_http=debug",
            Environment::Staging | Environment::Production => "blog_api=info,tower_http=info",
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.listing.default_page_size, 10);
        assert_eq!(config.listing.max_page_size, Some(1000));
        assert_eq!(config.database.storage, StorageBackend::Postgres);
        assert!(config.security.jwt_secret.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.listing.max_page_size, Some(100));
        assert_eq!(config.database.max_connections, 50);
        assert_eq!(config.default_log_filter(), "blog_api=info,tower_http=info");
    }

    #[test]
    fn jwt_secret_is_never_serialized() {
        let mut config = AppConfig::development();
        config.security.jwt_secret = Some("hunter2".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
    }

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn invalid_max_page_size_keeps_the_preset_cap() {
        for bad in ["lots", "0", "-5", ""] {
            let config = AppConfig::production().with_overrides_from(overrides(&[("LISTING_MAX_PAGE_SIZE", bad)]));
            assert_eq!(config.listing.max_page_size, Some(100), "value {:?}", bad);
        }
    }

    #[test]
    fn valid_overrides_replace_presets() {
        let config = AppConfig::production().with_overrides_from(overrides(&[
            ("LISTING_MAX_PAGE_SIZE", "25"),
            ("LISTING_DEFAULT_PAGE_SIZE", "5"),
            ("PORT", "9001"),
            ("BLOG_API_STORAGE", "memory"),
            ("JWT_SECRET", ""),
        ]));
        assert_eq!(config.listing.max_page_size, Some(25));
        assert_eq!(config.listing.default_page_size, 5);
        assert_eq!(config.api.port, 9001);
        assert_eq!(config.database.storage, StorageBackend::Memory);
        assert!(config.security.jwt_secret.is_none());
    }
}
