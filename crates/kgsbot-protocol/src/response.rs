//! Parsing poll responses.
//!
//! Every GET against the servlet answers with a batch:
//!
//! ```text
//! { "messages": [ { "type": "HELLO", ... }, { "type": "LOGIN_SUCCESS", ... } ] }
//! ```
//!
//! [`ServerResponse::parse`] unwraps the batch and runs each element through
//! the [`Factory`], keeping server order.

use kgsbot_transport::HttpResponse;
use serde_json::Value;

use crate::{Factory, Message, MessageType, ProtocolError};

/// The messages carried by one server response, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerResponse {
    messages: Vec<Message>,
}

impl ServerResponse {
    /// Parses a raw response body.
    ///
    /// # Errors
    /// - `MalformedResponse`: not JSON, or no top-level `messages` array
    /// - anything [`Factory::create`] returns for an element
    pub fn parse(body: &[u8]) -> Result<Self, ProtocolError> {
        let root: Value = serde_json::from_slice(body)
            .map_err(|e| ProtocolError::MalformedResponse(e.to_string()))?;

        let Value::Object(mut root) = root else {
            return Err(ProtocolError::MalformedResponse(
                "top level is not an object".into(),
            ));
        };
        let Some(Value::Array(items)) = root.remove("messages") else {
            return Err(ProtocolError::MalformedResponse(
                "missing \"messages\" array".into(),
            ));
        };

        let factory = Factory;
        let messages = items
            .into_iter()
            .map(|item| factory.create(item))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = messages.len(), "parsed server response");
        Ok(Self { messages })
    }

    /// Parses the body of an HTTP response.
    pub fn from_http(response: &HttpResponse) -> Result<Self, ProtocolError> {
        Self::parse(&response.body)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// The first message of the given type, if any.
    pub fn find(&self, message_type: MessageType) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.message_type() == message_type)
    }

    pub fn contains(&self, message_type: MessageType) -> bool {
        self.find(message_type).is_some()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
