//! Turning messages into wire payloads and back.
//!
//! - [`Formatter`] flattens an outgoing [`Message`] into the JSON object the
//!   servlet expects (the body's declared fields plus `type`).
//! - [`Factory`] takes one inbound JSON object, picks the variant from its
//!   `type` tag, fills in the declared fields and runs post-load.

use serde_json::{Map, Value};

use crate::message::{load, MessageBody};
use crate::{Message, MessageType, ProtocolError};

/// A flat wire payload: field name → value.
pub type WirePayload = Map<String, Value>;

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Serializes outgoing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter;

impl Formatter {
    /// Returns the message's declared fields plus its `type` tag.
    ///
    /// The verb is not a field: it decides how the payload travels, it does
    /// not travel itself.
    ///
    /// # Errors
    /// `Encode` if a field fails to serialize.
    pub fn format(&self, message: &Message) -> Result<WirePayload, ProtocolError> {
        match serde_json::to_value(message.body()).map_err(ProtocolError::Encode)? {
            Value::Object(map) => Ok(map),
            other => Err(ProtocolError::NotAMessage(format!(
                "{} body serialized to a non-object: {other}",
                message.message_type()
            ))),
        }
    }

    /// Flattens a payload into query parameters for a GET.
    ///
    /// Strings go as-is; everything else as its JSON text.
    pub fn to_query(&self, payload: &WirePayload) -> Vec<(String, String)> {
        payload
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Builds messages from inbound JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct Factory;

impl Factory {
    /// Instantiates the variant named by `payload["type"]`.
    ///
    /// Fields absent from the payload keep their defaults; keys the variant
    /// does not declare are ignored. The result is always tagged `GET`.
    ///
    /// # Errors
    /// - `NotAMessage`: not an object, or no string `type`
    /// - `UnsupportedMessageType`: unknown tag
    /// - `Decode`: a declared field has the wrong JSON shape
    /// - `InvalidField`: post-load rejected a nested record
    pub fn create(&self, payload: Value) -> Result<Message, ProtocolError> {
        let Value::Object(ref object) = payload else {
            return Err(ProtocolError::NotAMessage(format!(
                "expected a JSON object, got {payload}"
            )));
        };
        let tag = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ProtocolError::NotAMessage("missing string \"type\" field".into())
            })?;
        let message_type: MessageType = tag.parse()?;

        let body = match message_type {
            MessageType::Login => MessageBody::Login(load(payload)?),
            MessageType::Hello => MessageBody::Hello(load(payload)?),
            MessageType::LoginSuccess => MessageBody::LoginSuccess(load(payload)?),
            MessageType::LoginFailedBadPassword => {
                MessageBody::LoginFailedBadPassword
            }
            MessageType::Logout => MessageBody::Logout,
            MessageType::RoomJoin => MessageBody::RoomJoin(load(payload)?),
            MessageType::WakeUp => MessageBody::WakeUp,
        };

        tracing::trace!(%message_type, "message created from payload");
        Ok(Message::inbound(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, HelloMessage, LoginMessage};
    use serde_json::json;

    #[test]
    fn test_format_login_is_flat_object_without_action() {
        let msg = Message::login(LoginMessage::new("OSRBot", ""));
        let payload = Formatter.format(&msg).unwrap();

        assert_eq!(payload["type"], "LOGIN");
        assert_eq!(payload["name"], "OSRBot");
        assert_eq!(payload["password"], "");
        assert_eq!(payload["locale"], "en_US");
        assert!(!payload.contains_key("action"));
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn test_to_query_stringifies_values() {
        let mut payload = WirePayload::new();
        payload.insert("type".into(), json!("ROOM_JOIN"));
        payload.insert("channelId".into(), json!(42));

        let mut query = Formatter.to_query(&payload);
        query.sort();
        assert_eq!(
            query,
            vec![
                ("channelId".to_string(), "42".to_string()),
                ("type".to_string(), "ROOM_JOIN".to_string()),
            ]
        );
    }

    #[test]
    fn test_create_hello() {
        let msg = Factory
            .create(json!({
                "type": "HELLO",
                "versionMajor": "3",
                "versionMinor": "8",
                "versionBugfix": "0",
                "jsonClientBuild": "x"
            }))
            .unwrap();

        assert_eq!(msg.message_type(), MessageType::Hello);
        assert_eq!(
            msg.body(),
            &MessageBody::Hello(HelloMessage {
                version_major: "3".into(),
                version_minor: "8".into(),
                version_bugfix: "0".into(),
                json_client_build: "x".into(),
            })
        );
    }

    #[test]
    fn test_create_always_tags_get() {
        // LOGIN is a POST when we build it, but anything coming through the
        // factory came from the server.
        let msg = Factory
            .create(json!({"type": "LOGIN", "name": "x", "action": "POST"}))
            .unwrap();
        assert_eq!(msg.action(), Action::Get);
    }

    #[test]
    fn test_create_missing_fields_keep_defaults() {
        let msg = Factory.create(json!({"type": "LOGIN", "name": "x"})).unwrap();
        let MessageBody::Login(login) = msg.body() else {
            panic!("expected a login body");
        };
        assert_eq!(login.name, "x");
        assert_eq!(login.password, "");
        assert_eq!(login.locale, "en_US");
    }

    #[test]
    fn test_create_ignores_undeclared_keys() {
        let msg = Factory
            .create(json!({"type": "WAKE_UP", "somethingElse": [1, 2]}))
            .unwrap();
        assert_eq!(msg.body(), &MessageBody::WakeUp);
    }

    #[test]
    fn test_create_unknown_type_is_unsupported() {
        let result = Factory.create(json!({"type": "CHAT"}));
        assert!(matches!(
            result,
            Err(ProtocolError::UnsupportedMessageType(ref t)) if t == "CHAT"
        ));
    }

    #[test]
    fn test_create_non_object_is_not_a_message() {
        assert!(matches!(
            Factory.create(json!([1, 2, 3])),
            Err(ProtocolError::NotAMessage(_))
        ));
        assert!(matches!(
            Factory.create(json!({"name": "no type"})),
            Err(ProtocolError::NotAMessage(_))
        ));
        assert!(matches!(
            Factory.create(json!({"type": 7})),
            Err(ProtocolError::NotAMessage(_))
        ));
    }
}
