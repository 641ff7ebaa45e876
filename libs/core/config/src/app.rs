//! Service-wide settings.
//!
//! Values are resolved in three layers: built-in defaults, then an optional
//! YAML file named by `CONFIG_FILE`, then individual environment variables.
//! An environment variable only overrides when it is actually set.

use crate::server::ServerConfig;
use crate::{env_parse, ConfigError, Environment};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Typed settings consumed by every component of the service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub metrics_port: u16,
    /// PostgreSQL connection string; the in-memory repository is used when unset
    pub database_url: Option<String>,
    /// Secondary cache connection string (reserved, no cache is wired)
    pub redis_url: Option<String>,
    /// Token signing secret (reserved, no auth is wired)
    pub jwt_secret: Option<String>,
    /// Upper bound for the summed size of request headers, in bytes
    pub max_header_size: usize,
    /// Seconds
    pub read_timeout: u64,
    /// Seconds
    pub write_timeout: u64,
    /// Seconds in-flight requests get to drain after a termination signal
    pub shutdown_timeout: u64,
    /// Empty means any origin (without credentials)
    pub cors_allowed_origins: Vec<String>,
    pub security_headers: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            metrics_port: 9090,
            database_url: None,
            redis_url: None,
            jwt_secret: None,
            max_header_size: 1_048_576,
            read_timeout: 30,
            write_timeout: 30,
            shutdown_timeout: 30,
            cors_allowed_origins: Vec::new(),
            security_headers: true,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `CONFIG_FILE` (if set), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match non_empty_var("CONFIG_FILE") {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Reads settings from a YAML file. Keys missing from the file keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: display.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseFile {
            path: display,
            source,
        })
    }

    /// Applies every environment variable that is set on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(host) = non_empty_var("APP_HOST") {
            self.host = host;
        }
        if let Some(port) = env_parse("APP_PORT")? {
            self.port = port;
        }
        if let Some(environment) = non_empty_var("ENVIRONMENT") {
            self.environment = environment;
        }
        if let Some(level) = non_empty_var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(port) = env_parse("METRICS_PORT")? {
            self.metrics_port = port;
        }
        if let Some(url) = non_empty_var("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(url) = non_empty_var("REDIS_URL") {
            self.redis_url = Some(url);
        }
        if let Some(secret) = non_empty_var("JWT_SECRET") {
            self.jwt_secret = Some(secret);
        }
        if let Some(size) = env_parse("MAX_HEADER_SIZE")? {
            self.max_header_size = size;
        }
        if let Some(secs) = env_parse("READ_TIMEOUT")? {
            self.read_timeout = secs;
        }
        if let Some(secs) = env_parse("WRITE_TIMEOUT")? {
            self.write_timeout = secs;
        }
        if let Some(secs) = env_parse("SHUTDOWN_TIMEOUT")? {
            self.shutdown_timeout = secs;
        }
        if let Some(origins) = non_empty_var("CORS_ALLOWED_ORIGIN") {
            self.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(enabled) = env_parse("SECURITY_HEADERS")? {
            self.security_headers = enabled;
        }
        Ok(self)
    }

    pub fn environment(&self) -> Environment {
        Environment::from_name(&self.environment)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port)
    }

    pub fn metrics_server(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.metrics_port)
    }

    /// Per-request deadline; covers both the read and the write phase.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout.max(self.write_timeout))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .field("metrics_port", &self.metrics_port)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("max_header_size", &self.max_header_size)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("security_headers", &self.security_headers)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ALL_KEYS: [&str; 15] = [
        "CONFIG_FILE",
        "APP_HOST",
        "APP_PORT",
        "ENVIRONMENT",
        "LOG_LEVEL",
        "METRICS_PORT",
        "DATABASE_URL",
        "REDIS_URL",
        "JWT_SECRET",
        "MAX_HEADER_SIZE",
        "READ_TIMEOUT",
        "WRITE_TIMEOUT",
        "SHUTDOWN_TIMEOUT",
        "CORS_ALLOWED_ORIGIN",
        "SECURITY_HEADERS",
    ];

    fn with_clean_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_KEYS
            .iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_load_defaults() {
        with_clean_env(&[], || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.server().address(), "0.0.0.0:8080");
            assert_eq!(config.metrics_server().address(), "0.0.0.0:9090");
            assert_eq!(config.environment(), Environment::Development);
            assert!(config.database_url.is_none());
            assert_eq!(config.max_header_size, 1_048_576);
            assert!(config.security_headers);
        });
    }

    #[test]
    fn test_env_overrides_defaults() {
        with_clean_env(
            &[
                ("APP_PORT", "3000"),
                ("ENVIRONMENT", "production"),
                ("LOG_LEVEL", "debug"),
                ("DATABASE_URL", "postgres://localhost/app"),
                ("CORS_ALLOWED_ORIGIN", "http://a.test, http://b.test,"),
                ("SECURITY_HEADERS", "false"),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.port, 3000);
                assert_eq!(config.environment(), Environment::Production);
                assert_eq!(config.log_level, "debug");
                assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/app"));
                assert_eq!(config.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
                assert!(!config.security_headers);
            },
        );
    }

    #[test]
    fn test_empty_database_url_is_unset() {
        with_clean_env(&[("DATABASE_URL", "")], || {
            let config = AppConfig::load().unwrap();
            assert!(config.database_url.is_none());
        });
    }

    #[test]
    fn test_invalid_port_is_parse_error() {
        with_clean_env(&[("METRICS_PORT", "not_a_number")], || {
            let err = AppConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "METRICS_PORT"));
        });
    }

    #[test]
    fn test_yaml_file_then_env_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "host: 127.0.0.1\nport: 7000\nenvironment: staging\nread_timeout: 5\nwrite_timeout: 12"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        with_clean_env(&[("CONFIG_FILE", path.as_str()), ("APP_PORT", "7001")], || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 7001);
            assert_eq!(config.environment(), Environment::Staging);
            // keys absent from the file keep defaults
            assert_eq!(config.metrics_port, 9090);
            assert_eq!(config.request_timeout(), Duration::from_secs(12));
        });
    }

    #[test]
    fn test_missing_yaml_file_is_read_error() {
        with_clean_env(&[("CONFIG_FILE", "/definitely/not/here.yaml")], || {
            let err = AppConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::ReadFile { .. }));
            assert!(err.to_string().contains("/definitely/not/here.yaml"));
        });
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: [not, a, port]").unwrap();

        let err = AppConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig {
            jwt_secret: Some("super-secret".to_string()),
            database_url: Some("postgres://user:hunter2@db/app".to_string()),
            ..AppConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
