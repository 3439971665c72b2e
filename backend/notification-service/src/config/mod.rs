/// Configuration management for notification-service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub smtp: SmtpConfig,
    pub fanout: FanoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub host: String,
    pub port: u16,
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
    pub database_url: Option<String>,
    pub run_migrations: bool,
}

/// SMTP settings; an empty host switches the mailer to no-op mode
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub starttls: bool,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("starttls", &self.starttls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Maximum emails in flight per fan-out
    pub email_concurrency: usize,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("PORT", 8000)?,
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
            run_migrations: parse_env("RUN_MIGRATIONS", true)?,
        };

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_default(),
            port: parse_env("SMTP_PORT", 587)?,
            username: std::env::var("SMTP_USERNAME").ok().filter(|v| !v.is_empty()),
            password: std::env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Cinema Admin <noreply@cinema.dev>".to_string()),
            starttls: parse_env("SMTP_STARTTLS", true)?,
            timeout_secs: parse_env("SMTP_TIMEOUT_SECS", 10)?,
        };

        let email_concurrency: usize = parse_env("FANOUT_EMAIL_CONCURRENCY", 4)?;
        if email_concurrency == 0 {
            bail!("FANOUT_EMAIL_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            app,
            storage,
            smtp,
            fanout: FanoutConfig { email_concurrency },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "LOG_FORMAT",
        "STORAGE_BACKEND",
        "DATABASE_URL",
        "RUN_MIGRATIONS",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USERNAME",
        "SMTP_PASSWORD",
        "SMTP_FROM",
        "SMTP_STARTTLS",
        "SMTP_TIMEOUT_SECS",
        "FANOUT_EMAIL_CONCURRENCY",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_with_memory_backend() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8000);
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.starttls);
        assert_eq!(config.smtp.timeout_secs, 10);
        assert!(config.smtp.host.is_empty());
        assert_eq!(config.fanout.email_concurrency, 4);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("SMTP_PORT", "not-a-port");
        assert!(Config::from_env().is_err());

        std::env::set_var("SMTP_PORT", "2525");
        std::env::set_var("FANOUT_EMAIL_CONCURRENCY", "0");
        assert!(Config::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_hides_password() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("SMTP_PASSWORD", "hunter2");

        let config = Config::from_env().unwrap();
        let rendered = format!("{:?}", config.smtp);
        assert!(!rendered.contains("hunter2"));

        clear_env();
    }
}
