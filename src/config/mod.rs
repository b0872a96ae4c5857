use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "memory" | "mem" | "document" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub query_timeout_secs: u64,
    pub aggregate_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_limit: i64,
    pub status_default_limit: i64,
    pub max_limit: i64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    /// Shared key for `GET /api/alumni/check`. Empty rejects every key.
    #[serde(skip_serializing)]
    pub api_key: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = StoreBackend::parse(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_SECS") {
            self.database.query_timeout_secs = v.parse().unwrap_or(self.database.query_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_AGGREGATE_TIMEOUT_SECS") {
            self.database.aggregate_timeout_secs = v.parse().unwrap_or(self.database.aggregate_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_LIMIT") {
            self.api.default_limit = v.parse().unwrap_or(self.api.default_limit);
        }
        if let Ok(v) = env::var("API_STATUS_DEFAULT_LIMIT") {
            self.api.status_default_limit = v.parse().unwrap_or(self.api.status_default_limit);
        }
        if let Ok(v) = env::var("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().unwrap_or(self.api.max_limit);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("API_KEY") {
            self.security.api_key = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                max_connections: 10,
                connection_timeout: 30,
                query_timeout_secs: 10,
                aggregate_timeout_secs: 30,
            },
            api: ApiConfig {
                default_limit: 10,
                status_default_limit: 20,
                max_limit: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-only-secret".to_string(),
                api_key: "development-only-key".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                bcrypt_cost: 8,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 20,
                connection_timeout: 10,
                query_timeout_secs: 10,
                aggregate_timeout_secs: 30,
            },
            api: ApiConfig {
                default_limit: 10,
                status_default_limit: 20,
                max_limit: 500,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                api_key: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                max_connections: 50,
                connection_timeout: 5,
                query_timeout_secs: 10,
                aggregate_timeout_secs: 30,
            },
            api: ApiConfig {
                default_limit: 10,
                status_default_limit: 20,
                max_limit: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                api_key: String::new(),
                jwt_expiry_hours: 4,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
        }
    }

    /// Clamps a requested page size to `api.max_limit`.
    pub fn clamp_limit(&self, requested: i64) -> i64 {
        if requested > self.api.max_limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", requested, self.api.max_limit);
            self.api.max_limit
        } else {
            requested
        }
    }
}

/// Port from `ALUMNI_API_PORT`, then `PORT`.
pub fn port_from_env() -> Option<u16> {
    ["ALUMNI_API_PORT", "PORT"]
        .iter()
        .find_map(|key| env::var(key).ok().and_then(|v| v.parse().ok()))
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
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.api.max_limit, 1000);
        assert_eq!(config.api.default_limit, 10);
        assert_eq!(config.api.status_default_limit, 20);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.api.max_limit, 100);
        assert_eq!(config.database.aggregate_timeout_secs, 30);
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.api_key.is_empty());
    }

    #[test]
    fn test_clamp_limit() {
        let config = AppConfig::staging();
        assert_eq!(config.clamp_limit(20), 20);
        assert_eq!(config.clamp_limit(10_000), 500);
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(StoreBackend::parse("PostgreSQL"), Some(StoreBackend::Postgres));
        assert_eq!(StoreBackend::parse("memory"), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("mongo"), None);
    }
}
