//! Event bus envelope
//!
//! Only `detail` is interpreted. The rest is metadata kept for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduled or rule-matched event as delivered by the event bus
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "detail-type", default, skip_serializing_if = "Option::is_none")]
    pub detail_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Originating cloud account, not the bank account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default)]
    pub resources: Vec<String>,

    /// Untyped event payload
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl EventEnvelope {
    /// Envelope carrying only a detail payload
    pub fn with_detail(detail: serde_json::Value) -> Self {
        Self {
            detail,
            ..Default::default()
        }
    }

    /// Identifier for log correlation
    pub fn event_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }
}
