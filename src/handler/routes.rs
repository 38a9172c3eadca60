//! HTTP invoke surface
//!
//! Accepts event envelopes over HTTP and reports only the outcome. The
//! detokenized values never leave the process through this surface.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use super::{EventHandler, AGENT_ID, AGENT_VERSION};
use crate::contracts::EventEnvelope;
use crate::error::{DetokenizeError, HandlerError};

/// Create the router
pub fn create_router(handler: Arc<EventHandler>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/invoke", post(invoke))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_id: AGENT_ID.to_string(),
        agent_version: AGENT_VERSION.to_string(),
    })
}

async fn invoke(
    State(handler): State<Arc<EventHandler>>,
    Json(event): Json<EventEnvelope>,
) -> Result<Json<InvokeResponse>, (StatusCode, Json<ApiError>)> {
    match handler.handle(&event).await {
        Ok(response) => Ok(Json(InvokeResponse {
            status: "ok".to_string(),
            results: response.results.len(),
        })),
        Err(e) => Err((
            status_for(&e),
            Json(ApiError {
                error: e.kind().to_string(),
                message: e.summary(),
            }),
        )),
    }
}

/// HTTP status reported to the invoker for a failed invocation
pub fn status_for(error: &HandlerError) -> StatusCode {
    match error {
        HandlerError::Event { .. } => StatusCode::BAD_REQUEST,
        HandlerError::Detokenize { source, .. } => match source {
            DetokenizeError::NotFound { .. } => StatusCode::NOT_FOUND,
            DetokenizeError::Config { .. }
            | DetokenizeError::Encoding { .. }
            | DetokenizeError::RequestBuild { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DetokenizeError::Transport { .. }
            | DetokenizeError::Server { .. }
            | DetokenizeError::UnexpectedStatus { .. }
            | DetokenizeError::Decoding { .. } => StatusCode::BAD_GATEWAY,
        },
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
}

/// Successful invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub status: String,
    /// Number of values the service returned
    pub results: usize,
}

/// API error
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, HandlerConfig};
    use crate::error::EventError;
    use crate::telemetry::LogContext;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router(endpoint: &str) -> Router {
        let handler = EventHandler::new(
            HandlerConfig::new(endpoint),
            Credentials::default(),
            &LogContext::default(),
        );
        create_router(Arc::new(handler))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router("")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: HealthResponse = read_json(response).await;
        assert_eq!(body.agent_id, AGENT_ID);
    }

    #[tokio::test]
    async fn test_invoke_with_invalid_event() {
        let request = Request::post("/invoke")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"detail": {"accountNumber": ""}}"#))
            .unwrap();

        let response = router("http://192.0.2.1:9").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = read_json(response).await;
        assert_eq!(body.error, "validation");
    }

    #[tokio::test]
    async fn test_invoke_without_endpoint() {
        let request = Request::post("/invoke")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"detail": {"accountNumber": "tok-1"}}"#))
            .unwrap();

        let response = router("").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiError = read_json(response).await;
        assert_eq!(body.error, "config");
    }

    #[test]
    fn test_status_for() {
        let not_found = HandlerError::Detokenize {
            data_element: "deACCOUNTNUM".to_string(),
            source: DetokenizeError::NotFound {
                url: "http://svc".to_string(),
            },
        };
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let unexpected = HandlerError::Detokenize {
            data_element: "deACCOUNTNUM".to_string(),
            source: DetokenizeError::UnexpectedStatus {
                status: 503,
                body: None,
            },
        };
        assert_eq!(status_for(&unexpected), StatusCode::BAD_GATEWAY);

        let invalid = HandlerError::Event {
            event_id: "-".to_string(),
            source: EventError::Validation {
                field: "AccountNumber",
            },
        };
        assert_eq!(status_for(&invalid), StatusCode::BAD_REQUEST);
    }
}
