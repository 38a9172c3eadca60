//! Environment-sourced settings
//!
//! Every loader takes a lookup function so tests never touch the process
//! environment. `from_env` wires the lookup to `std::env::var`.

use std::fmt;
use std::str::FromStr;

use crate::contracts::DEFAULT_DATA_ELEMENT;
use crate::error::ConfigError;

pub const API_ENDPOINT_VAR: &str = "API_ENDPOINT";
pub const AUTH_TOKEN_VAR: &str = "AUTH_TOKEN";
pub const API_KEY_VAR: &str = "API_KEY";
pub const ID_CLAIM_VAR: &str = "ID-CLAIM";
pub const DATA_ELEMENT_VAR: &str = "DATA_ELEMENT";
pub const ENV_VAR: &str = "ENV";
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Identity headers sent with every detokenization request.
///
/// Missing values are sent as empty headers; the service rejects them.
#[derive(Clone, Default)]
pub struct Credentials {
    pub auth_token: String,
    pub api_key: String,
    pub id_claim: String,
}

impl Credentials {
    pub fn new(
        auth_token: impl Into<String>,
        api_key: impl Into<String>,
        id_claim: impl Into<String>,
    ) -> Self {
        Self {
            auth_token: auth_token.into(),
            api_key: api_key.into(),
            id_claim: id_claim.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            auth_token: lookup(AUTH_TOKEN_VAR).unwrap_or_default(),
            api_key: lookup(API_KEY_VAR).unwrap_or_default(),
            id_claim: lookup(ID_CLAIM_VAR).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn state(value: &str) -> &'static str {
            if value.is_empty() {
                "<empty>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Credentials")
            .field("auth_token", &state(&self.auth_token))
            .field("api_key", &state(&self.api_key))
            .field("id_claim", &state(&self.id_claim))
            .finish()
    }
}

/// Where and how the handler detokenizes
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Base URL of the detokenization service; empty means unset
    pub endpoint: String,

    pub data_element: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            data_element: DEFAULT_DATA_ELEMENT.to_string(),
        }
    }
}

impl HandlerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_data_element(mut self, data_element: impl Into<String>) -> Self {
        self.data_element = data_element.into();
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            endpoint: lookup(API_ENDPOINT_VAR).unwrap_or_default(),
            data_element: lookup(DATA_ELEMENT_VAR)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DATA_ELEMENT.to_string()),
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Log record encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Typed logging settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// `LOG_LEVEL` wins; otherwise `ENV=dev|test` selects debug.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let level = match lookup(LOG_LEVEL_VAR).filter(|v| !v.is_empty()) {
            Some(level) => level.parse()?,
            None => {
                let env = lookup(ENV_VAR).unwrap_or_default().to_lowercase();
                if env == "dev" || env == "test" {
                    LogLevel::Debug
                } else {
                    LogLevel::Info
                }
            }
        };

        let format = match lookup(LOG_FORMAT_VAR).filter(|v| !v.is_empty()) {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self { level, format })
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_default_to_empty() {
        let creds = Credentials::from_lookup(lookup(&[(AUTH_TOKEN_VAR, "tok")]));
        assert_eq!(creds.auth_token, "tok");
        assert_eq!(creds.api_key, "");
        assert_eq!(creds.id_claim, "");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::new("secret-token", "", "claim");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<empty>"));
    }

    #[test]
    fn test_handler_config_from_lookup() {
        let config = HandlerConfig::from_lookup(lookup(&[(API_ENDPOINT_VAR, "https://svc")]));
        assert_eq!(config.endpoint, "https://svc");
        assert_eq!(config.data_element, DEFAULT_DATA_ELEMENT);

        let config = HandlerConfig::from_lookup(lookup(&[(DATA_ELEMENT_VAR, "deSSN")]));
        assert!(config.endpoint.is_empty());
        assert_eq!(config.data_element, "deSSN");
    }

    #[test]
    fn test_logging_env_selects_debug() {
        let config = LoggingConfig::from_lookup(lookup(&[(ENV_VAR, "DEV")])).unwrap();
        assert_eq!(config.level, LogLevel::Debug);

        let config = LoggingConfig::from_lookup(lookup(&[(ENV_VAR, "prod")])).unwrap();
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn test_logging_explicit_level_wins() {
        let config = LoggingConfig::from_lookup(lookup(&[
            (ENV_VAR, "test"),
            (LOG_LEVEL_VAR, "warn"),
            (LOG_FORMAT_VAR, "text"),
        ]))
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn test_logging_rejects_unknown_values() {
        assert!(LoggingConfig::from_lookup(lookup(&[(LOG_LEVEL_VAR, "loud")])).is_err());
        assert!(LoggingConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")])).is_err());
    }
}
