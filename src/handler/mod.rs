//! Event handler
//!
//! Runs the extractor then the client, once per event. Each invocation
//! is independent; the handler only holds read-only state.

pub mod routes;

pub use routes::{create_router, ApiError, HealthResponse, InvokeResponse};

use std::sync::Arc;

use crate::client::DetokenizeClient;
use crate::config::{Credentials, HandlerConfig};
use crate::contracts::{DetokenizeResponse, EventEnvelope};
use crate::error::HandlerError;
use crate::extract::EventExtractor;
use crate::telemetry::{LogContext, PayloadFormatter};

/// Agent identifier
pub const AGENT_ID: &str = "account-expansion-agent";

/// Agent version (from Cargo.toml)
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event handler
#[derive(Debug, Clone)]
pub struct EventHandler {
    config: HandlerConfig,
    extractor: EventExtractor,
    client: DetokenizeClient,
    formatter: Arc<PayloadFormatter>,
}

impl EventHandler {
    pub fn new(config: HandlerConfig, credentials: Credentials, logging: &LogContext) -> Self {
        let formatter = logging.formatter();
        Self {
            config,
            extractor: EventExtractor::new(Arc::clone(&formatter)),
            client: DetokenizeClient::with_formatter(credentials, Arc::clone(&formatter)),
            formatter,
        }
    }

    /// Handler configured from `API_ENDPOINT`, `DATA_ELEMENT` and the credential variables
    pub fn from_env(logging: &LogContext) -> Self {
        Self::new(HandlerConfig::from_env(), Credentials::from_env(), logging)
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle one event: extract the account, detokenize it, log the outcome
    pub async fn handle(&self, event: &EventEnvelope) -> Result<DetokenizeResponse, HandlerError> {
        let event_id = event.event_id();

        let request = self
            .extractor
            .extract_request(event, &self.config.data_element)
            .map_err(|source| HandlerError::Event {
                event_id: event_id.to_string(),
                source,
            })?;

        let response = self
            .client
            .detokenize(&self.config.endpoint, &request.field_name, &request.values)
            .await
            .map_err(|source| {
                tracing::error!(
                    event_id = event_id,
                    error_kind = source.kind(),
                    status_code = ?source.status(),
                    rejected = source.is_rejection(),
                    error = %source.summary(),
                    "Error in detokenization request"
                );
                HandlerError::Detokenize {
                    data_element: self.config.data_element.clone(),
                    source,
                }
            })?;

        if !response.result_count_matches(&request) {
            tracing::warn!(
                event_id = event_id,
                expected = request.values.len(),
                received = response.results.len(),
                "Detokenization result count does not match request"
            );
        }

        tracing::info!(
            event_id = event_id,
            response = %self.formatter.render(&response),
            "Detokenization request successful"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DetokenizeError, EventError};
    use serde_json::json;

    fn handler(endpoint: &str) -> EventHandler {
        EventHandler::new(
            HandlerConfig::new(endpoint),
            Credentials::default(),
            &LogContext::default(),
        )
    }

    #[tokio::test]
    async fn test_missing_account_fails_before_network() {
        // Unroutable endpoint: reaching the network would surface as a transport error
        let handler = handler("http://192.0.2.1:9");
        let event = EventEnvelope::with_detail(json!({}));

        let err = handler.handle(&event).await.unwrap_err();

        assert!(matches!(
            err,
            HandlerError::Event {
                source: EventError::Validation { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_config_error() {
        let handler = handler("");
        let event = EventEnvelope::with_detail(json!({"accountNumber": "tok-1"}));

        let err = handler.handle(&event).await.unwrap_err();

        assert!(matches!(
            err,
            HandlerError::Detokenize {
                source: DetokenizeError::Config { .. },
                ..
            }
        ));
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_default_data_element() {
        let handler = handler("https://svc");
        assert_eq!(handler.config().data_element, "deACCOUNTNUM");
    }
}
