//! Event extraction
//!
//! Decodes the event detail into an `InboundEvent` and checks that it
//! names an account. No network access happens here.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::contracts::{DetokenizeRequest, EventEnvelope, InboundEvent};
use crate::error::EventError;
use crate::telemetry::PayloadFormatter;

/// Decode a raw event detail.
///
/// A `null` detail is treated as an empty object, so it fails validation
/// rather than decoding.
pub fn decode_detail(detail: &Value) -> Result<InboundEvent, EventError> {
    let event: InboundEvent = match detail {
        Value::Null => InboundEvent::default(),
        other => InboundEvent::deserialize(other)?,
    };

    if event.account_number.is_empty() {
        return Err(EventError::Validation {
            field: "AccountNumber",
        });
    }

    Ok(event)
}

/// Validates inbound events and logs them through the payload formatter
#[derive(Debug, Clone)]
pub struct EventExtractor {
    formatter: Arc<PayloadFormatter>,
}

impl EventExtractor {
    pub fn new(formatter: Arc<PayloadFormatter>) -> Self {
        Self { formatter }
    }

    pub fn extract(&self, envelope: &EventEnvelope) -> Result<InboundEvent, EventError> {
        tracing::debug!(
            event_id = envelope.event_id(),
            event = %self.formatter.render(envelope),
            "Received following event"
        );

        decode_detail(&envelope.detail).map_err(|e| {
            match &e {
                EventError::Decode(_) => {
                    tracing::error!(
                        event_id = envelope.event_id(),
                        error = %e.summary(),
                        "Error unmarshalling event detail"
                    );
                }
                EventError::Validation { field } => {
                    tracing::error!(
                        event_id = envelope.event_id(),
                        field = *field,
                        "Required field is missing in the event data"
                    );
                }
            }
            e
        })
    }

    /// Extract and build the request for `data_element`
    pub fn extract_request(
        &self,
        envelope: &EventEnvelope,
        data_element: &str,
    ) -> Result<DetokenizeRequest, EventError> {
        let event = self.extract(envelope)?;
        let request = event.into_request(data_element);
        tracing::debug!(
            request = %self.formatter.render(&request),
            "Prepared detokenization payload"
        );
        Ok(request)
    }
}

impl Default for EventExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PayloadFormatter::standard()))
    }
}
