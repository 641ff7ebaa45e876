pub mod app;
pub mod server;
pub mod tracing;

pub use app::AppConfig;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseFile {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Deployment environment the service runs in.
///
/// Only `Production` changes runtime behaviour (JSON logs); the other variants
/// exist so the status endpoint and metrics can report them faithfully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// Maps a free-form environment name. Unknown names are treated as development.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" => Environment::Staging,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Static application identity reported by health and status endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Returns the parsed value of `key` if it is set, `None` if it is unset.
pub fn env_parse<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::ParseError {
                key: key.to_string(),
                details: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_name_case_insensitive() {
        assert_eq!(Environment::from_name("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::from_name("Prod"), Environment::Production);
        assert_eq!(Environment::from_name("Staging"), Environment::Staging);
        assert_eq!(Environment::from_name("test"), Environment::Test);
        assert!(Environment::from_name("production").is_production());
        assert!(!Environment::from_name("staging").is_production());
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        assert_eq!(Environment::from_name("qa"), Environment::Development);
        assert_eq!(Environment::Development.as_str(), "development");
    }

    #[test]
    fn test_app_info_macro_uses_crate_metadata() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_parse_unset_is_none() {
        temp_env::with_var_unset("PARSE_ME", || {
            let value: Option<u16> = env_parse("PARSE_ME").unwrap();
            assert!(value.is_none());
        });
    }

    #[test]
    fn test_env_parse_invalid_names_key() {
        temp_env::with_var("PARSE_ME", Some("eighty"), || {
            let err = env_parse::<u16>("PARSE_ME").unwrap_err();
            assert!(err.to_string().contains("PARSE_ME"));
        });
    }
}
