use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::filter::MAX_PAGE_LIMIT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub query: QueryConfig,
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. Without one the service runs on in-memory stores.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifierMode {
    /// Verify HS256 tokens locally with `jwt_secret`
    Jwt,
    /// Ask the managed auth service who the bearer is
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub verifier: VerifierMode,
    pub remote_url: Option<String>,
    pub remote_api_key: Option<String>,
    pub directory_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    pub enabled: bool,
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

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("BACKOFFICE_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.auth.jwt_expiry_hours = v.parse().unwrap_or(self.auth.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("AUTH_VERIFIER") {
            self.auth.verifier = match v.to_ascii_lowercase().as_str() {
                "remote" => VerifierMode::Remote,
                "jwt" => VerifierMode::Jwt,
                _ => self.auth.verifier,
            };
        }
        if let Ok(v) = env::var("AUTH_REMOTE_URL") {
            self.auth.remote_url = Some(v);
        }
        if let Ok(v) = env::var("AUTH_REMOTE_API_KEY") {
            self.auth.remote_api_key = Some(v);
        }
        if let Ok(v) = env::var("AUTH_DIRECTORY_TABLE") {
            self.auth.directory_table = v;
        }

        // Query overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = v.parse().unwrap_or(self.query.default_limit);
        }
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().unwrap_or(self.query.max_limit).min(MAX_PAGE_LIMIT);
        }

        // Realtime overrides
        if let Ok(v) = env::var("REALTIME_ENABLED") {
            self.realtime.enabled = v.parse().unwrap_or(self.realtime.enabled);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                verifier: VerifierMode::Jwt,
                remote_url: None,
                remote_api_key: None,
                directory_table: "users".to_string(),
            },
            query: QueryConfig {
                default_limit: 10,
                max_limit: 100,
            },
            realtime: RealtimeConfig { enabled: true },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                verifier: VerifierMode::Jwt,
                remote_url: None,
                remote_api_key: None,
                directory_table: "users".to_string(),
            },
            query: QueryConfig {
                default_limit: 10,
                max_limit: 100,
            },
            realtime: RealtimeConfig { enabled: true },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                verifier: VerifierMode::Remote,
                remote_url: None,
                remote_api_key: None,
                directory_table: "users".to_string(),
            },
            query: QueryConfig {
                default_limit: 10,
                max_limit: 100,
            },
            realtime: RealtimeConfig { enabled: true },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
