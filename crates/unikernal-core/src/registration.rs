//! The REGISTER handshake payload.

use crate::{Envelope, Payload, ServiceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Intent announcing an adapter to the hub.
pub const REGISTER: &str = "REGISTER";

/// Payload of a REGISTER envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub service_id: String,
    pub auth: Auth,
}

/// Credentials presented to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub key: String,
}

impl Registration {
    pub fn new(service_id: &ServiceId, auth_key: impl Into<String>) -> Self {
        Self {
            service_id: service_id.to_string(),
            auth: Auth {
                key: auth_key.into(),
            },
        }
    }

    /// Wrap into a REGISTER envelope.
    pub fn into_envelope(self) -> Envelope {
        let mut auth = Payload::new();
        auth.insert("key".into(), Value::String(self.auth.key));

        let mut payload = Payload::new();
        payload.insert("service_id".into(), Value::String(self.service_id));
        payload.insert("auth".into(), Value::Object(auth));
        Envelope::new(REGISTER, payload)
    }

    /// Read the registration carried by a REGISTER envelope.
    ///
    /// Both `service_id` and `auth.key` must be non-empty; this is the check
    /// a hub applies, the adapter itself sends whatever key it was given.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, RegistrationError> {
        if envelope.intent != REGISTER {
            return Err(RegistrationError::WrongIntent(envelope.intent.clone()));
        }
        let registration: Self =
            serde_json::from_value(Value::Object(envelope.payload.clone()))?;
        if registration.service_id.is_empty() {
            return Err(RegistrationError::MissingServiceId);
        }
        if registration.auth.key.is_empty() {
            return Err(RegistrationError::MissingAuthKey);
        }
        Ok(registration)
    }
}

/// Build the REGISTER envelope an adapter sends when its connection opens.
pub fn build_registration(service_id: &ServiceId, auth_key: &str) -> Envelope {
    Registration::new(service_id, auth_key).into_envelope()
}

/// Error reading a registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("expected REGISTER intent, got {0}")]
    WrongIntent(String),
    #[error("registration has no service_id")]
    MissingServiceId,
    #[error("registration has no auth key")]
    MissingAuthKey,
    #[error("malformed registration payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode, encode};
    use serde_json::json;

    #[test]
    fn build() {
        let id = ServiceId::new("svc-1").unwrap();
        let env = build_registration(&id, "k");
        assert_eq!(env.intent, "REGISTER");
        assert_eq!(
            Value::Object(env.payload),
            json!({"service_id": "svc-1", "auth": {"key": "k"}})
        );
    }

    #[test]
    fn wire_format() {
        let id = ServiceId::new("java-service").unwrap();
        let text = encode(&build_registration(&id, "adapter-key"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "intent": "REGISTER",
                "payload": {"service_id": "java-service", "auth": {"key": "adapter-key"}}
            })
        );
    }

    #[test]
    fn envelope_matches_serde_shape() {
        let id = ServiceId::new("svc-1").unwrap();
        let registration = Registration::new(&id, "k");
        let expected = serde_json::to_value(&registration).unwrap();
        let env = registration.into_envelope();
        assert_eq!(env.payload.len(), 2);
        assert_eq!(Value::Object(env.payload.clone()), expected);
        assert_eq!(Registration::from_envelope(&env).unwrap().service_id, "svc-1");
    }

    #[test]
    fn empty_key_passes_through() {
        let id = ServiceId::new("svc-1").unwrap();
        let env = build_registration(&id, "");
        assert_eq!(env.payload["auth"]["key"], "");
        assert!(matches!(
            Registration::from_envelope(&env),
            Err(RegistrationError::MissingAuthKey)
        ));
    }

    #[test]
    fn read_back() {
        let env = decode(
            r#"{"intent":"REGISTER","payload":{"service_id":"py","auth":{"key":"s3"},"language":"python"}}"#,
        )
        .unwrap();
        let reg = Registration::from_envelope(&env).unwrap();
        assert_eq!(reg.service_id, "py");
        assert_eq!(reg.auth.key, "s3");
    }

    #[test]
    fn read_rejects() {
        assert!(matches!(
            Registration::from_envelope(&Envelope::bare("PING")),
            Err(RegistrationError::WrongIntent(_))
        ));
        assert!(matches!(
            Registration::from_envelope(&Envelope::bare(REGISTER)),
            Err(RegistrationError::Malformed(_))
        ));
        let env = decode(r#"{"intent":"REGISTER","payload":{"service_id":"","auth":{"key":"k"}}}"#)
            .unwrap();
        assert!(matches!(
            Registration::from_envelope(&env),
            Err(RegistrationError::MissingServiceId)
        ));
    }
}
