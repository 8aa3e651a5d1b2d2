//! # JSON envelope for channel messages.
//!
//! Providers whose message channel carries JSON bodies can share this codec instead of
//! writing their own. Inbound messages look like:
//!
//! ```text
//! {"event": "JOIN", "instance": "i-0abc", "token": "s3cr3t", "application": "consul"}
//! {"event": 1, "instance": "i-0def"}
//! ```
//!
//! - `event`: wire name (case-insensitive) or numeric code (`0` JOIN, `1` LAUNCH, `2` TERMINATE)
//! - `instance`: required
//! - `token`, `application`: optional
//!
//! Outbound join messages wrap the event together with the handshake payload:
//!
//! ```text
//! {"application": "consul", "event": {"event": "JOIN", "instance": "i-0abc"}, "payload": {...}}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::DecodeError;
use crate::events::{Event, EventKind};
use crate::provider::Payload;

#[derive(Deserialize)]
struct Inbound {
    event: Option<Value>,
    instance: Option<String>,
    token: Option<String>,
    application: Option<String>,
}

/// Decodes one message body into an [`Event`].
///
/// # Example
/// ```
/// use joule::{EventKind, envelope};
///
/// let ev = envelope::decode(r#"{"event": "launch", "instance": "i-7"}"#).unwrap();
/// assert_eq!(ev.kind(), EventKind::Launch);
/// assert_eq!(ev.instance(), "i-7");
///
/// assert!(envelope::decode(r#"{"event": "REBOOT", "instance": "i-7"}"#).is_err());
/// ```
pub fn decode(raw: &str) -> Result<Event, DecodeError> {
    let body: Map<String, Value> = serde_json::from_str(raw)?;
    let inbound = Inbound::deserialize(Value::Object(body))?;

    let kind = match inbound.event {
        None | Some(Value::Null) => return Err(DecodeError::MissingField { field: "event" }),
        Some(value) => decode_kind(value)?,
    };
    let instance = inbound
        .instance
        .ok_or(DecodeError::MissingField { field: "instance" })?;

    let mut event = Event::new(kind, instance);
    if let Some(token) = inbound.token {
        event = event.with_token(token);
    }
    if let Some(application) = inbound.application {
        event = event.with_application(application);
    }
    Ok(event)
}

fn decode_kind(value: Value) -> Result<EventKind, DecodeError> {
    let kind = match &value {
        Value::String(name) => EventKind::from_name(name),
        Value::Number(n) => n.as_u64().and_then(EventKind::from_code),
        _ => None,
    };
    kind.ok_or_else(|| DecodeError::UnknownKind {
        kind: match value {
            Value::String(name) => name,
            other => other.to_string(),
        },
    })
}

/// Encodes an [`Event`] as an inbound-compatible JSON value.
pub fn encode(event: &Event) -> Value {
    let mut body = json!({
        "event": event.kind().as_str(),
        "instance": event.instance(),
    });
    if let Some(obj) = body.as_object_mut() {
        if let Some(token) = event.token() {
            obj.insert("token".into(), Value::from(token));
        }
        if let Some(application) = event.application() {
            obj.insert("application".into(), Value::from(application));
        }
    }
    body
}

/// Encodes an outbound join message carrying `payload` for `application`.
pub fn encode_join(application: &str, event: &Event, payload: &Payload) -> Value {
    json!({
        "application": application,
        "event": encode(event),
        "payload": Value::Object(payload.clone()),
    })
}
