//! Account Expansion Agent Contracts
//!
//! Wire types for the inbound account event and the detokenization exchange.

mod event;

pub use event::*;

use serde::{Deserialize, Serialize};

/// Data element used when none is configured
pub const DEFAULT_DATA_ELEMENT: &str = "deACCOUNTNUM";

/// Payload sent to the detokenization service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetokenizeRequest {
    /// Data element naming the detokenization rule to apply
    #[serde(rename = "data_element")]
    pub field_name: String,

    /// Tokens to resolve, in order
    #[serde(rename = "data")]
    pub values: Vec<String>,
}

impl DetokenizeRequest {
    /// Create a request
    pub fn new(field_name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            field_name: field_name.into(),
            values,
        }
    }

    /// Check the request invariants before it goes on the wire
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.field_name.is_empty() {
            return Err("data element must not be empty");
        }
        if self.values.is_empty() {
            return Err("at least one value is required");
        }
        Ok(())
    }
}

/// Body returned by the detokenization service on 200
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetokenizeResponse {
    pub encoding: String,

    /// One result per submitted token, same order
    pub results: Vec<String>,

    /// Status flag as reported by the service, not interpreted
    pub success: String,
}

impl DetokenizeResponse {
    /// Whether the service returned one result per submitted value.
    ///
    /// The service does not guarantee this; callers decide what a
    /// mismatch means.
    pub fn result_count_matches(&self, request: &DetokenizeRequest) -> bool {
        self.results.len() == request.values.len()
    }
}

/// Custom fields carried in the event detail
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "accountNumber", default)]
    pub account_number: String,
}

impl InboundEvent {
    /// Build the detokenization request for this account
    pub fn into_request(self, data_element: impl Into<String>) -> DetokenizeRequest {
        DetokenizeRequest::new(data_element, vec![self.account_number])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_request_wire_names() {
        let request = DetokenizeRequest::new(DEFAULT_DATA_ELEMENT, vec!["123456".to_string()]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"data_element": "deACCOUNTNUM", "data": ["123456"]})
        );
    }

    #[test]
    fn test_request_round_trip() {
        let request = DetokenizeRequest::new("deACCOUNTNUM", vec!["123456".to_string()]);
        let encoded = serde_json::to_vec(&request).unwrap();
        let decoded: DetokenizeRequest = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(decoded, request);
    }

    #[test]
    fn test_request_validate() {
        assert!(DetokenizeRequest::new("deACCOUNTNUM", vec!["1".to_string()])
            .validate()
            .is_ok());
        assert!(DetokenizeRequest::new("", vec!["1".to_string()])
            .validate()
            .is_err());
        assert!(DetokenizeRequest::new("deACCOUNTNUM", vec![]).validate().is_err());
    }

    #[test]
    fn test_response_requires_all_fields() {
        let ok: Result<DetokenizeResponse, _> = serde_json::from_str(
            r#"{"encoding":"utf8","results":["4111"],"success":"true"}"#,
        );
        assert!(ok.is_ok());

        let missing: Result<DetokenizeResponse, _> =
            serde_json::from_str(r#"{"encoding":"utf8","results":["4111"]}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_result_count_matches() {
        let request = DetokenizeRequest::new("deACCOUNTNUM", vec!["a".into(), "b".into()]);
        let response = DetokenizeResponse {
            encoding: "utf8".to_string(),
            results: vec!["x".to_string()],
            success: "true".to_string(),
        };

        assert!(!response.result_count_matches(&request));
    }

    #[test]
    fn test_inbound_event_missing_account_defaults_empty() {
        let event: InboundEvent = serde_json::from_str("{}").unwrap();
        assert!(event.account_number.is_empty());
    }

    proptest! {
        #[test]
        fn request_round_trip_is_lossless(
            field in "[ -~]{1,24}",
            values in proptest::collection::vec("[ -~]{0,32}", 1..4),
        ) {
            let request = DetokenizeRequest::new(field, values);
            let encoded = serde_json::to_string(&request).unwrap();
            let decoded: DetokenizeRequest = serde_json::from_str(&encoded).unwrap();
            prop_assert_eq!(decoded, request);
        }
    }
}
