//! The intent envelope.
//!
//! Wire shape: `{"intent": <string>, "payload": <object>}`. The intent is an
//! open string tag; the payload is opaque and intent-specific.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope payload: string keys to arbitrary JSON values.
pub type Payload = Map<String, Value>;

/// A message exchanged with the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message purpose, e.g. `"REGISTER"`.
    pub intent: String,
    /// Intent-specific data.
    #[serde(default)]
    pub payload: Payload,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(intent: impl Into<String>, payload: Payload) -> Self {
        Self {
            intent: intent.into(),
            payload,
        }
    }

    /// Create an envelope with an empty payload.
    pub fn bare(intent: impl Into<String>) -> Self {
        Self::new(intent, Payload::new())
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// Serialize an envelope to its wire text.
pub fn encode(envelope: &Envelope) -> String {
    // A struct of a String and a string-keyed map always serializes.
    serde_json::to_string(envelope).unwrap_or_default()
}

/// Parse wire text into an envelope.
///
/// A missing or `null` payload is normalized to an empty map. Top-level
/// fields other than `intent` and `payload` are ignored.
pub fn decode(text: &str) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let intent = match object.remove("intent") {
        Some(Value::String(intent)) if intent.is_empty() => return Err(DecodeError::EmptyIntent),
        Some(Value::String(intent)) => intent,
        Some(_) => return Err(DecodeError::IntentNotString),
        None => return Err(DecodeError::MissingIntent),
    };

    let payload = match object.remove("payload") {
        None | Some(Value::Null) => Payload::new(),
        Some(Value::Object(payload)) => payload,
        Some(_) => return Err(DecodeError::PayloadNotObject),
    };

    Ok(Envelope { intent, payload })
}

/// Error decoding an inbound message.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message must be a JSON object")]
    NotAnObject,
    #[error("message has no intent")]
    MissingIntent,
    #[error("intent must be a string")]
    IntentNotString,
    #[error("intent cannot be empty")]
    EmptyIntent,
    #[error("payload must be a JSON object")]
    PayloadNotObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn roundtrip() {
        let env = Envelope::new(
            "QUERY",
            payload(json!({"n": 3, "tags": ["a", "b"], "nested": {"ok": true, "none": null}})),
        );
        assert_eq!(decode(&encode(&env)).unwrap(), env);

        let bare = Envelope::bare("PING");
        assert_eq!(decode(&encode(&bare)).unwrap(), bare);
    }

    #[test]
    fn encode_shape() {
        let env = Envelope::new("PING", payload(json!({"seq": 1})));
        let value: Value = serde_json::from_str(&encode(&env)).unwrap();
        assert_eq!(value, json!({"intent": "PING", "payload": {"seq": 1}}));
    }

    #[test]
    fn decode_ping() {
        let env = decode(r#"{"intent":"PING","payload":{}}"#).unwrap();
        assert_eq!(env, Envelope::bare("PING"));
    }

    #[test]
    fn missing_payload_is_empty() {
        assert_eq!(decode(r#"{"intent":"PING"}"#).unwrap().payload, Payload::new());
        assert_eq!(
            decode(r#"{"intent":"PING","payload":null}"#).unwrap().payload,
            Payload::new()
        );
    }

    #[test]
    fn extra_fields_ignored() {
        let env = decode(r#"{"intent":"PING","payload":{},"version":"8.0"}"#).unwrap();
        assert_eq!(env, Envelope::bare("PING"));
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(decode(""), Err(DecodeError::Json(_))));
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode(r#"["PING", {}]"#), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode(r#""PING""#), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode(r#"{"payload":{}}"#), Err(DecodeError::MissingIntent)));
        assert!(matches!(decode(r#"{"intent":7}"#), Err(DecodeError::IntentNotString)));
        assert!(matches!(decode(r#"{"intent":""}"#), Err(DecodeError::EmptyIntent)));
        assert!(matches!(
            decode(r#"{"intent":"PING","payload":[1]}"#),
            Err(DecodeError::PayloadNotObject)
        ));
    }
}
