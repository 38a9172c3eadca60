//! Payload formatting for log records
//!
//! Payload types carry a `KIND` tag. The formatter maps each tag to a
//! label and a formatting function that redacts sensitive fields. Tags
//! without an entry are labelled and logged as-is.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::contracts::{DetokenizeRequest, DetokenizeResponse, EventEnvelope, InboundEvent};

/// Rewrites a serialized payload before it is logged
pub type FormatFn = fn(Value) -> Value;

/// A type that can be handed to the formatter
pub trait LogPayload: Serialize {
    const KIND: &'static str;
}

impl LogPayload for InboundEvent {
    const KIND: &'static str = "inbound_event";
}

impl LogPayload for EventEnvelope {
    const KIND: &'static str = "event_envelope";
}

impl LogPayload for DetokenizeRequest {
    const KIND: &'static str = "detokenize_request";
}

impl LogPayload for DetokenizeResponse {
    const KIND: &'static str = "detokenize_response";
}

#[derive(Clone, Copy)]
struct Entry {
    label: &'static str,
    format: FormatFn,
}

/// Registry of per-kind formatting functions
#[derive(Clone, Default)]
pub struct PayloadFormatter {
    entries: HashMap<&'static str, Entry>,
}

impl PayloadFormatter {
    /// Formatter with no registered kinds
    pub fn empty() -> Self {
        Self::default()
    }

    /// Formatter with redaction for every payload this crate logs
    pub fn standard() -> Self {
        Self::empty()
            .register(
                InboundEvent::KIND,
                "Inbound account event",
                redact_inbound_event,
            )
            .register(
                EventEnvelope::KIND,
                "Event received from the event bus",
                redact_envelope,
            )
            .register(
                DetokenizeRequest::KIND,
                "Request to detokenize values",
                redact_request,
            )
            .register(
                DetokenizeResponse::KIND,
                "Response from the detokenization service",
                redact_response,
            )
    }

    /// Add or replace the entry for `kind`
    pub fn register(mut self, kind: &'static str, label: &'static str, format: FormatFn) -> Self {
        self.entries.insert(kind, Entry { label, format });
        self
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Structured form: `{"object_type": label, "value": formatted}`
    pub fn format<T: LogPayload>(&self, payload: &T) -> Value {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => json!({ "unserializable": e.to_string() }),
        };
        self.format_value(T::KIND, value)
    }

    pub fn format_value(&self, kind: &str, value: Value) -> Value {
        match self.entries.get(kind) {
            Some(entry) => {
                let formatted = (entry.format)(value);
                json!({
                    "object_type": entry.label,
                    "value": formatted,
                })
            }
            None => json!({
                "object_type": kind,
                "value": value,
            }),
        }
    }

    /// Format a raw body that should hold a `kind` payload.
    ///
    /// Bodies that are not JSON are reduced to their length.
    pub fn format_body(&self, kind: &str, body: &[u8]) -> Value {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.format_value(kind, value),
            Err(_) => json!({
                "object_type": self.label(kind),
                "unparsed_bytes": body.len(),
            }),
        }
    }

    fn label<'a>(&'a self, kind: &'a str) -> &'a str {
        self.entries.get(kind).map_or(kind, |entry| entry.label)
    }

    /// Display adapter for use as a tracing field: `payload = %fmt.render(&p)`
    pub fn render<'a, T: LogPayload>(&'a self, payload: &'a T) -> Rendered<'a, T> {
        Rendered {
            formatter: self,
            payload,
        }
    }
}

impl fmt::Debug for PayloadFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.entries.keys().collect();
        kinds.sort();
        f.debug_struct("PayloadFormatter").field("kinds", &kinds).finish()
    }
}

/// Lazily formatted payload; serialization only happens if the record is emitted
pub struct Rendered<'a, T> {
    formatter: &'a PayloadFormatter,
    payload: &'a T,
}

impl<T: LogPayload> fmt::Display for Rendered<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatter.format(self.payload))
    }
}

/// Keep the last four characters, star out the rest
pub fn mask(value: &str) -> String {
    let count = value.chars().count();
    let keep = if count > 4 { 4 } else { 0 };
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < count - keep { '*' } else { c })
        .collect()
}

fn mask_string_field(object: &mut Value, key: &str) {
    if let Some(Value::String(s)) = object.get_mut(key) {
        *s = mask(s);
    }
}

fn mask_string_array(object: &mut Value, key: &str) {
    if let Some(Value::Array(items)) = object.get_mut(key) {
        for item in items.iter_mut() {
            if let Value::String(s) = item {
                *s = mask(s);
            }
        }
    }
}

fn redact_inbound_event(mut value: Value) -> Value {
    mask_string_field(&mut value, "accountNumber");
    value
}

fn redact_envelope(mut value: Value) -> Value {
    if let Some(detail) = value.get_mut("detail") {
        mask_string_field(detail, "accountNumber");
    }
    value
}

fn redact_request(mut value: Value) -> Value {
    mask_string_array(&mut value, "data");
    value
}

/// Only `encoding` and `success` survive unmasked, whatever shape the body has
fn redact_response(mut value: Value) -> Value {
    match &mut value {
        Value::Object(fields) => {
            for (key, field) in fields.iter_mut() {
                if key != "encoding" && key != "success" {
                    mask_all(field);
                }
            }
        }
        other => mask_all(other),
    }
    value
}

fn mask_all(value: &mut Value) {
    let masked = match value {
        Value::String(s) => mask(s),
        Value::Number(n) => mask(&n.to_string()),
        Value::Array(items) => {
            items.iter_mut().for_each(mask_all);
            return;
        }
        Value::Object(fields) => {
            fields.values_mut().for_each(mask_all);
            return;
        }
        Value::Bool(_) | Value::Null => return,
    };
    *value = Value::String(masked);
}

/// Cut a body down for a log record without splitting a character
pub fn truncate_body(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
