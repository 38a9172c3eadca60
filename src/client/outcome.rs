//! Status classification for detokenization responses.
//!
//! This is the only place that looks at status codes. Every status maps
//! to exactly one variant; none of them lead back to another attempt.

use reqwest::StatusCode;

use crate::error::DetokenizeError;

/// Classified response from the detokenization service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// 200 with the raw body, not yet decoded
    Ok(Vec<u8>),
    /// 404, body discarded
    NotFound,
    /// 500, body discarded
    ServerError,
    /// Anything else, with the body if there was one
    Unexpected { status: u16, body: Option<String> },
}

impl ResponseOutcome {
    /// Consume the response, reading the body only where it is kept.
    ///
    /// A failure to read a 200 body is a transport failure. Unreadable
    /// bodies on unexpected statuses are treated as empty.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        match response.status() {
            StatusCode::OK => Ok(Self::Ok(response.bytes().await?.to_vec())),
            StatusCode::NOT_FOUND => Ok(Self::NotFound),
            StatusCode::INTERNAL_SERVER_ERROR => Ok(Self::ServerError),
            status => {
                let body = response.text().await.unwrap_or_default();
                Ok(Self::Unexpected {
                    status: status.as_u16(),
                    body: (!body.is_empty()).then_some(body),
                })
            }
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Ok(_) => 200,
            Self::NotFound => 404,
            Self::ServerError => 500,
            Self::Unexpected { status, .. } => *status,
        }
    }

    /// The 200 body, or the rejection as an error
    pub fn into_body(self, url: &str) -> Result<Vec<u8>, DetokenizeError> {
        match self {
            Self::Ok(body) => Ok(body),
            Self::NotFound => Err(DetokenizeError::NotFound {
                url: url.to_string(),
            }),
            Self::ServerError => Err(DetokenizeError::Server {
                url: url.to_string(),
            }),
            Self::Unexpected { status, body } => {
                Err(DetokenizeError::UnexpectedStatus { status, body })
            }
        }
    }
}
