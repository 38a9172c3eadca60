//! Detokenization service client
//!
//! One call, one HTTP exchange. The client has no timeout and never
//! retries; cancelling is up to the caller, who can drop the future.

pub mod outcome;

pub use outcome::ResponseOutcome;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;

use crate::config::Credentials;
use crate::contracts::{DetokenizeRequest, DetokenizeResponse};
use crate::error::DetokenizeError;
use crate::telemetry::{truncate_body, LogPayload, PayloadFormatter};

/// Service path appended to the configured endpoint base
pub const DETOKENIZE_PATH: &str = "/v1/data/sdm-protect/cloud-protegrity/unprotect";

const API_KEY_HEADER: &str = "api-key";
const ID_CLAIM_HEADER: &str = "id-claim";

/// Bodies in log records are cut to this many bytes
const LOG_BODY_LIMIT: usize = 512;

/// Detokenization client
#[derive(Debug, Clone)]
pub struct DetokenizeClient {
    client: reqwest::Client,
    credentials: Credentials,
    formatter: Arc<PayloadFormatter>,
}

impl DetokenizeClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_formatter(credentials, Arc::new(PayloadFormatter::standard()))
    }

    pub fn with_formatter(credentials: Credentials, formatter: Arc<PayloadFormatter>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            formatter,
        }
    }

    /// Join the endpoint base and the service path
    pub fn endpoint_url(endpoint_base: &str) -> Result<String, DetokenizeError> {
        let base = endpoint_base.trim();
        if base.is_empty() {
            return Err(DetokenizeError::Config {
                message: "API endpoint is required".to_string(),
            });
        }
        Ok(format!("{}{}", base.trim_end_matches('/'), DETOKENIZE_PATH))
    }

    /// Resolve `values` for `field_name` against the service at `endpoint_base`
    pub async fn detokenize(
        &self,
        endpoint_base: &str,
        field_name: &str,
        values: &[String],
    ) -> Result<DetokenizeResponse, DetokenizeError> {
        let url = Self::endpoint_url(endpoint_base).map_err(|e| {
            tracing::error!(error = %e, "API endpoint is missing");
            e
        })?;

        let payload = DetokenizeRequest::new(field_name, values.to_vec());
        let body = self.encode(&payload)?;
        tracing::info!(url = %url, "Payload marshalled successfully");

        let request = self.build_request(&url, body)?;

        let response = self.client.execute(request).await.map_err(|source| {
            tracing::error!(url = %url, error = %source, "Error sending HTTP request");
            DetokenizeError::Transport {
                url: url.clone(),
                source,
            }
        })?;
        tracing::info!(
            url = %url,
            status_code = response.status().as_u16(),
            "HTTP request sent successfully"
        );

        let outcome = ResponseOutcome::read(response).await.map_err(|source| {
            tracing::error!(url = %url, error = %source, "Error reading response body");
            DetokenizeError::Transport {
                url: url.clone(),
                source,
            }
        })?;
        self.log_outcome(&url, &outcome);

        let body = outcome.into_body(&url)?;
        self.decode(&body)
    }

    fn encode(&self, payload: &DetokenizeRequest) -> Result<Vec<u8>, DetokenizeError> {
        let encoded = payload
            .validate()
            .map_err(|reason| reason.to_string())
            .and_then(|()| serde_json::to_vec(payload).map_err(|e| e.to_string()));

        encoded.map_err(|message| {
            tracing::error!(
                payload = %self.formatter.render(payload),
                error = %message,
                "Error marshalling JSON payload"
            );
            DetokenizeError::Encoding { message }
        })
    }

    fn build_request(&self, url: &str, body: Vec<u8>) -> Result<reqwest::Request, DetokenizeError> {
        let fail = |message: String| {
            tracing::error!(url = %url, error = %message, "Error creating HTTP request");
            DetokenizeError::RequestBuild {
                url: url.to_string(),
                message,
            }
        };

        let parsed = Url::parse(url).map_err(|e| fail(e.to_string()))?;

        self.client
            .post(parsed)
            .header(CONTENT_TYPE, "application/json")
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credentials.auth_token),
            )
            .header(API_KEY_HEADER, self.credentials.api_key.as_str())
            .header(ID_CLAIM_HEADER, self.credentials.id_claim.as_str())
            .body(body)
            .build()
            .map_err(|e| fail(e.to_string()))
    }

    fn log_outcome(&self, url: &str, outcome: &ResponseOutcome) {
        let status_code = outcome.status();
        match outcome {
            ResponseOutcome::Ok(_) => {
                tracing::info!(status_code, "Received 200 OK response");
            }
            ResponseOutcome::NotFound => {
                tracing::warn!(url = %url, status_code, "Resource not found (404)");
            }
            ResponseOutcome::ServerError => {
                tracing::error!(url = %url, status_code, "Internal server error (500)");
            }
            ResponseOutcome::Unexpected { body, .. } => match body {
                Some(body) => tracing::warn!(
                    url = %url,
                    status_code,
                    response_body = %self.loggable_body(body.as_bytes()),
                    "Received non-2xx response code: {}",
                    status_code
                ),
                None => tracing::warn!(
                    url = %url,
                    status_code,
                    "Received non-2xx response code: {}",
                    status_code
                ),
            },
        }
    }

    fn decode(&self, body: &[u8]) -> Result<DetokenizeResponse, DetokenizeError> {
        match serde_json::from_slice::<DetokenizeResponse>(body) {
            Ok(response) => {
                tracing::info!(
                    response = %self.formatter.render(&response),
                    "Received API response successfully"
                );
                Ok(response)
            }
            Err(source) => {
                let err = DetokenizeError::Decoding { source };
                tracing::error!(
                    response_body = %self.loggable_body(body),
                    error = %err.summary(),
                    "Error unmarshalling response"
                );
                Err(err)
            }
        }
    }

    /// Redacted, truncated rendering of a response body for a log record
    fn loggable_body(&self, body: &[u8]) -> String {
        let formatted = self
            .formatter
            .format_body(DetokenizeResponse::KIND, body)
            .to_string();
        truncate_body(&formatted, LOG_BODY_LIMIT).to_string()
    }
}
