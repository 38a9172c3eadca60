//! Error types for the Account Expansion Agent
//!
//! One enum per component. `HandlerError` wraps both with the
//! invocation context.

use thiserror::Error;

/// Failures while turning an event detail into an `InboundEvent`
#[derive(Error, Debug)]
pub enum EventError {
    /// Detail is not shaped like `{"accountNumber": string}`
    #[error("failed to unmarshal event detail: {0}")]
    Decode(#[from] serde_json::Error),

    /// Detail decoded but a required field is empty
    #[error("{field} is required in the event data")]
    Validation { field: &'static str },
}

impl EventError {
    /// Stable tag for logs and API errors
    pub fn kind(&self) -> &'static str {
        match self {
            EventError::Decode(_) => "decode",
            EventError::Validation { .. } => "validation",
        }
    }

    /// Display form without the decoder's echo of the offending value
    pub fn summary(&self) -> String {
        match self {
            EventError::Decode(source) => format!(
                "failed to unmarshal event detail: {:?} error at line {} column {}",
                source.classify(),
                source.line(),
                source.column()
            ),
            other => other.to_string(),
        }
    }
}

/// Failures of a single detokenization exchange
#[derive(Error, Debug)]
pub enum DetokenizeError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("error marshalling JSON payload: {message}")]
    Encoding { message: String },

    #[error("error creating request for {url}: {message}")]
    RequestBuild { url: String, message: String },

    #[error("error making request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("resource not found (404) for URL: {url}")]
    NotFound { url: String },

    #[error("internal server error (500) for URL: {url}")]
    Server { url: String },

    #[error("received non-2xx response code: {status}, body: {}", .body.as_deref().unwrap_or(""))]
    UnexpectedStatus { status: u16, body: Option<String> },

    #[error("error unmarshalling response: {source}")]
    Decoding {
        #[source]
        source: serde_json::Error,
    },
}

impl DetokenizeError {
    /// Stable tag for logs and API errors
    pub fn kind(&self) -> &'static str {
        match self {
            DetokenizeError::Config { .. } => "config",
            DetokenizeError::Encoding { .. } => "encoding",
            DetokenizeError::RequestBuild { .. } => "request_build",
            DetokenizeError::Transport { .. } => "transport",
            DetokenizeError::NotFound { .. } => "not_found",
            DetokenizeError::Server { .. } => "server_error",
            DetokenizeError::UnexpectedStatus { .. } => "unexpected_status",
            DetokenizeError::Decoding { .. } => "decoding",
        }
    }

    /// Display form without anything the remote service sent back.
    ///
    /// Response bodies and decoder messages can carry detokenized values,
    /// so logs and API errors use this instead of `to_string`.
    pub fn summary(&self) -> String {
        match self {
            DetokenizeError::UnexpectedStatus { status, .. } => {
                format!("received non-2xx response code: {}", status)
            }
            DetokenizeError::Decoding { source } => format!(
                "error unmarshalling response: {:?} error at line {} column {}",
                source.classify(),
                source.line(),
                source.column()
            ),
            other => other.to_string(),
        }
    }

    /// The remote service answered with a status other than 200
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DetokenizeError::NotFound { .. }
                | DetokenizeError::Server { .. }
                | DetokenizeError::UnexpectedStatus { .. }
        )
    }

    /// Status code reported by the remote service, if it answered
    pub fn status(&self) -> Option<u16> {
        match self {
            DetokenizeError::NotFound { .. } => Some(404),
            DetokenizeError::Server { .. } => Some(500),
            DetokenizeError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Terminal failure of one handler invocation
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("invalid event {event_id}: {source}")]
    Event {
        event_id: String,
        #[source]
        source: EventError,
    },

    #[error("detokenization request for {data_element} failed: {source}")]
    Detokenize {
        data_element: String,
        #[source]
        source: DetokenizeError,
    },
}

impl HandlerError {
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::Event { source, .. } => source.kind(),
            HandlerError::Detokenize { source, .. } => source.kind(),
        }
    }

    /// Display form safe to log or return to an invoker
    pub fn summary(&self) -> String {
        match self {
            HandlerError::Event { event_id, source } => {
                format!("invalid event {}: {}", event_id, source.summary())
            }
            HandlerError::Detokenize {
                data_element,
                source,
            } => format!(
                "detokenization request for {} failed: {}",
                data_element,
                source.summary()
            ),
        }
    }
}

/// Settings that could not be parsed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = EventError::Validation {
            field: "AccountNumber",
        };
        assert_eq!(err.to_string(), "AccountNumber is required in the event data");
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_unexpected_status_display() {
        let err = DetokenizeError::UnexpectedStatus {
            status: 503,
            body: Some("maintenance".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "received non-2xx response code: 503, body: maintenance"
        );

        let err = DetokenizeError::UnexpectedStatus {
            status: 302,
            body: None,
        };
        assert_eq!(err.to_string(), "received non-2xx response code: 302, body: ");
    }

    #[test]
    fn test_rejection_classification() {
        let url = "http://svc/v1".to_string();
        assert!(DetokenizeError::NotFound { url: url.clone() }.is_rejection());
        assert!(DetokenizeError::Server { url }.is_rejection());
        assert!(!DetokenizeError::Config {
            message: "missing".to_string()
        }
        .is_rejection());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DetokenizeError::NotFound {
                url: String::new()
            }
            .status(),
            Some(404)
        );
        assert_eq!(
            DetokenizeError::UnexpectedStatus {
                status: 418,
                body: None
            }
            .status(),
            Some(418)
        );
        assert_eq!(
            DetokenizeError::Encoding {
                message: String::new()
            }
            .status(),
            None
        );
    }

    #[test]
    fn test_summary_drops_remote_content() {
        let err = DetokenizeError::UnexpectedStatus {
            status: 503,
            body: Some("4111111111111111".to_string()),
        };
        assert_eq!(err.summary(), "received non-2xx response code: 503");

        let source =
            serde_json::from_str::<Vec<u32>>(r#""4111111111111111""#).unwrap_err();
        assert!(source.to_string().contains("4111111111111111"));
        let err = DetokenizeError::Decoding { source };
        assert!(!err.summary().contains("4111111111111111"));
        assert!(err.summary().starts_with("error unmarshalling response: Data error"));

        let err = HandlerError::Detokenize {
            data_element: "deACCOUNTNUM".to_string(),
            source: DetokenizeError::UnexpectedStatus {
                status: 418,
                body: Some("4111111111111111".to_string()),
            },
        };
        assert_eq!(
            err.summary(),
            "detokenization request for deACCOUNTNUM failed: received non-2xx response code: 418"
        );
    }

    #[test]
    fn test_handler_error_kind_follows_source() {
        let err = HandlerError::Detokenize {
            data_element: "deACCOUNTNUM".to_string(),
            source: DetokenizeError::Server {
                url: "http://svc".to_string(),
            },
        };
        assert_eq!(err.kind(), "server_error");
        assert!(err.to_string().starts_with("detokenization request for deACCOUNTNUM failed"));
    }
}
