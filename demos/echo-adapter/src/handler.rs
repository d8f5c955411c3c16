//! Envelope handling for the echo adapter.

use serde_json::Value;
use unikernal_client::{Envelope, ServiceId, Session};
use unikernal_core::Payload;

pub const HEARTBEAT: &str = "HEARTBEAT";
pub const HEARTBEAT_ACK: &str = "HEARTBEAT_ACK";
pub const ECHO: &str = "ECHO";
pub const ECHO_REPLY: &str = "ECHO_REPLY";

/// The reply owed for `envelope`, if any.
pub fn respond(service_id: &ServiceId, envelope: &Envelope) -> Option<Envelope> {
    match envelope.intent.as_str() {
        HEARTBEAT => {
            let mut payload = Payload::new();
            payload.insert("service_id".into(), Value::String(service_id.to_string()));
            Some(Envelope::new(HEARTBEAT_ACK, payload))
        }
        ECHO => Some(Envelope::new(ECHO_REPLY, envelope.payload.clone())),
        _ => None,
    }
}

pub fn handle(session: &Session, envelope: Envelope) {
    match respond(session.service_id(), &envelope) {
        Some(reply) => {
            tracing::debug!("{} -> {}", envelope.intent, reply.intent);
            if let Err(e) = session.send(&reply) {
                tracing::warn!("Dropped {} reply: {}", reply.intent, e);
            }
        }
        None => {
            tracing::info!(intent = %envelope.intent, "{}", serde_json::Value::Object(envelope.payload));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id() -> ServiceId {
        ServiceId::new("echo").unwrap()
    }

    #[test]
    fn heartbeat_acked() {
        let reply = respond(&id(), &Envelope::bare(HEARTBEAT)).unwrap();
        assert_eq!(reply.intent, HEARTBEAT_ACK);
        assert_eq!(reply.payload["service_id"], "echo");
    }

    #[test]
    fn echo_mirrors_payload() {
        let Value::Object(payload) = json!({"text": "hi", "n": [1, 2]}) else {
            unreachable!()
        };
        let reply = respond(&id(), &Envelope::new(ECHO, payload.clone())).unwrap();
        assert_eq!(reply, Envelope::new(ECHO_REPLY, payload));
    }

    #[test]
    fn other_intents_ignored() {
        assert!(respond(&id(), &Envelope::bare("REGISTER")).is_none());
        assert!(respond(&id(), &Envelope::bare("PING")).is_none());
    }
}
