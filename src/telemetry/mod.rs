//! Logging context
//!
//! Built once from a typed `LoggingConfig` and handed to components.
//! Nothing here mutates a process-wide level after startup.
//!
//! - `formatter` - per-kind payload labelling and redaction

pub mod formatter;

pub use formatter::{mask, truncate_body, FormatFn, LogPayload, PayloadFormatter};

use std::sync::Arc;

use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Explicitly constructed logging state shared by the handler components
#[derive(Debug, Clone)]
pub struct LogContext {
    config: LoggingConfig,
    formatter: Arc<PayloadFormatter>,
}

impl LogContext {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            formatter: Arc::new(PayloadFormatter::standard()),
        }
    }

    pub fn with_formatter(mut self, formatter: PayloadFormatter) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn formatter(&self) -> Arc<PayloadFormatter> {
        Arc::clone(&self.formatter)
    }

    /// `RUST_LOG` overrides the configured level when it is set
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.config.level.as_str()))
    }

    /// Build a subscriber for this configuration without installing it
    pub fn dispatch(&self) -> Dispatch {
        let timer = ChronoUtc::new(TIMESTAMP_FORMAT.to_string());
        let registry = tracing_subscriber::registry().with(self.filter());

        match self.config.format {
            LogFormat::Json => Dispatch::new(
                registry.with(tracing_subscriber::fmt::layer().json().with_timer(timer)),
            ),
            LogFormat::Text => {
                Dispatch::new(registry.with(tracing_subscriber::fmt::layer().with_timer(timer)))
            }
        }
    }

    /// Install as the global subscriber. Call once, from `main`.
    pub fn install(&self) -> Result<(), ConfigError> {
        tracing::dispatcher::set_global_default(self.dispatch())
            .map_err(|e| ConfigError::Logging(e.to_string()))
    }

    /// Install for the current thread until the guard is dropped
    pub fn scoped(&self) -> tracing::dispatcher::DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch())
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}
