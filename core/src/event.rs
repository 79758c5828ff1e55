//! Gateway events carried on the realtime stream.
//!
//! The gateway publishes one JSON object per successful write it proxies.
//! No field is guaranteed: producers evolve independently of the portal, so
//! decoding is lenient. A field with an unexpected JSON type is treated as
//! absent instead of rejecting the whole event.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "type": "tickets.changed",
//!   "service": "tickets",
//!   "method": "PATCH",
//!   "path": "/api/v1/tickets/42",
//!   "status_code": 200,
//!   "ts": "2025-01-01T00:00:00+00:00",
//!   "data": { "id": 42, "status": "assigned" }
//! }
//! ```
//!
//! An empty object (`{}`) is the heartbeat the gateway sends right after a
//! client connects; it carries nothing actionable.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Services whose writes are announced on the stream.
pub const MUTATION_SERVICES: &[&str] = &["tickets", "assignments"];

/// HTTP methods that count as writes.
pub const MUTATION_METHODS: &[&str] = &["POST", "PATCH", "PUT", "DELETE"];

/// Upstream status codes that count as a successful write.
pub const MUTATION_STATUSES: &[u16] = &[200, 201, 204];

/// Errors decoding an event payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Payload is not valid JSON
    #[error("Malformed event payload: {0}")]
    Malformed(String),

    /// Payload is valid JSON but not an object
    #[error("Event payload is not a JSON object")]
    NotAnObject,
}

/// A domain event published by the gateway.
///
/// Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatewayEvent {
    /// Dot-namespaced event type, e.g. `tickets.changed`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Short service name, e.g. `tickets`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// HTTP method of the write that triggered the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request path of the write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Upstream response status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Publication timestamp (RFC 3339 string, not parsed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    /// Request correlation ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Acting user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Role of the acting user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    /// Opaque payload (usually the upstream response body)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl GatewayEvent {
    /// Decode the joined `data:` text of a frame.
    ///
    /// Returns `Ok(None)` for a heartbeat (empty text or an empty object).
    ///
    /// Only objects are events. Arrays, strings, numbers, booleans and `null`
    /// are rejected rather than treated as an event with no fields, and an
    /// object with no members is a heartbeat however it is spaced.
    ///
    /// # Errors
    ///
    /// - [`EventError::Malformed`] if the text is not JSON
    /// - [`EventError::NotAnObject`] if the JSON is not an object
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::event::GatewayEvent;
    ///
    /// let event = GatewayEvent::parse(r#"{"service":"tickets","status_code":"oops"}"#)
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(event.service.as_deref(), Some("tickets"));
    /// assert_eq!(event.status_code, None);
    ///
    /// assert_eq!(GatewayEvent::parse("{}").unwrap(), None);
    /// ```
    pub fn parse(text: &str) -> Result<Option<Self>, EventError> {
        if text.is_empty() {
            return Ok(None);
        }

        let value: Value =
            serde_json::from_str(text).map_err(|e| EventError::Malformed(e.to_string()))?;

        match value {
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(map) => Ok(Some(Self::from_map(&map))),
            _ => Err(EventError::NotAnObject),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_owned);

        Self {
            kind: string("type"),
            service: string("service"),
            method: string("method"),
            path: string("path"),
            status_code: map
                .get("status_code")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok()),
            ts: string("ts"),
            correlation_id: string("correlation_id"),
            user_id: string("user_id"),
            user_role: string("user_role"),
            data: map.get("data").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Build the event announcing a proxied write, if the write qualifies.
    ///
    /// Only successful (`200`, `201`, `204`) `POST`/`PATCH`/`PUT`/`DELETE`
    /// requests to `tickets` or `assignments` are announced. The event type
    /// is `"{service}.changed"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::event::GatewayEvent;
    /// use chrono::Utc;
    ///
    /// let event = GatewayEvent::mutation("tickets", "patch", "/api/v1/tickets/7", 200, Utc::now());
    /// assert_eq!(event.unwrap().kind.as_deref(), Some("tickets.changed"));
    ///
    /// assert!(GatewayEvent::mutation("tickets", "GET", "/api/v1/tickets", 200, Utc::now()).is_none());
    /// ```
    #[must_use]
    pub fn mutation(
        service: &str,
        method: &str,
        path: &str,
        status_code: u16,
        ts: DateTime<Utc>,
    ) -> Option<Self> {
        let method = method.to_ascii_uppercase();

        let qualifies = MUTATION_SERVICES.contains(&service)
            && MUTATION_METHODS.contains(&method.as_str())
            && MUTATION_STATUSES.contains(&status_code);
        if !qualifies {
            return None;
        }

        Some(Self {
            kind: Some(format!("{service}.changed")),
            service: Some(service.to_owned()),
            method: Some(method),
            path: Some(path.to_owned()),
            status_code: Some(status_code),
            ts: Some(ts.to_rfc3339_opts(SecondsFormat::Micros, false)),
            ..Self::default()
        })
    }

    /// Attach the upstream response body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether the event names this service.
    #[must_use]
    pub fn is_service(&self, service: &str) -> bool {
        self.service.as_deref() == Some(service)
    }

    /// Whether the event type starts with `prefix`. An absent type matches nothing.
    #[must_use]
    pub fn has_type_prefix(&self, prefix: &str) -> bool {
        self.kind.as_deref().is_some_and(|kind| kind.starts_with(prefix))
    }
}
