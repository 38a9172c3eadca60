//! Account Expansion Agent
//!
//! Recovers the original account number for an inbound account event by
//! calling the detokenization service, and logs the outcome.
//!
//! # Flow
//! 1. **Extract** (`extract`): decode the event detail, require `accountNumber`.
//! 2. **Detokenize** (`client`): one POST to the service, status classified
//!    into `ResponseOutcome`, 200 bodies decoded into `DetokenizeResponse`.
//!
//! No retries, no batching, no persistence. Every invocation stands alone.
//!
//! ## Example
//!
//! ```rust,no_run
//! use account_expansion::{
//!     config::{Credentials, HandlerConfig, LoggingConfig},
//!     contracts::EventEnvelope,
//!     handler::EventHandler,
//!     telemetry::LogContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let logging = LogContext::new(LoggingConfig::from_env()?);
//!     logging.install()?;
//!
//!     let handler = EventHandler::new(
//!         HandlerConfig::new("https://detokenize.internal"),
//!         Credentials::from_env(),
//!         &logging,
//!     );
//!
//!     let event = EventEnvelope::with_detail(serde_json::json!({"accountNumber": "tok-9981"}));
//!     let response = handler.handle(&event).await?;
//!     println!("{} result(s)", response.results.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod telemetry;

#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use client::{DetokenizeClient, ResponseOutcome, DETOKENIZE_PATH};
pub use config::{Credentials, HandlerConfig, LogFormat, LogLevel, LoggingConfig};
pub use contracts::*;
pub use error::{ConfigError, DetokenizeError, EventError, HandlerError};
pub use extract::{decode_detail, EventExtractor};
pub use handler::{create_router, EventHandler, AGENT_ID, AGENT_VERSION};
pub use telemetry::{LogContext, LogPayload, PayloadFormatter};
