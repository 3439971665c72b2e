/// Configuration management for engagement-service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    pub http_port: u16,
    /// Emit JSON log lines instead of human readable output
    pub json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unsupported STORAGE_BACKEND: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Required for the postgres backend
    pub database_url: Option<String>,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: std::env::var("PORT")
                .ok()
                .map(|p| p.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(8085),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let backend: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = match backend {
            StorageBackend::Postgres => Some(
                std::env::var("DATABASE_URL")
                    .context("DATABASE_URL is required when STORAGE_BACKEND=postgres")?,
            ),
            StorageBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        let storage = StorageConfig {
            backend,
            database_url,
            run_migrations: std::env::var("RUN_MIGRATIONS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        };

        Ok(Self { app, storage })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "PORT",
            "LOG_FORMAT",
            "STORAGE_BACKEND",
            "DATABASE_URL",
            "RUN_MIGRATIONS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_memory_backend_needs_no_database() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");

        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.database_url.is_none());
        assert_eq!(config.app.http_port, 8085);
        assert!(!config.app.json_logs);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_postgres_backend_requires_url() {
        clear_env();
        assert!(Config::from_env().is_err());

        std::env::set_var("DATABASE_URL", "postgres://localhost/cinema");
        std::env::set_var("LOG_FORMAT", "JSON");
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.app.json_logs);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_unknown_backend() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "mongo");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
